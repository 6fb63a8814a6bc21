//! Params command implementation

use anyhow::Result;
use tracing::info;

pub fn run(config_path: String, overrides: Vec<String>) -> Result<()> {
    let config = super::load_config(&config_path, &overrides)?;
    info!(
        "Warm-up: {} bars, cooldown: {} days, time stop: {} days",
        config.strategy.warmup_period(),
        config.strategy.cooldown,
        config.strategy.time_stop
    );

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
