//! CLI subcommands

pub mod grid;
pub mod params;
pub mod scan;

use anyhow::{Context, Result};
use mean_reversion_core::Config;
use tracing::info;

/// Load a config file and apply `key=value` strategy overrides
pub fn load_config(config_path: &str, overrides: &[String]) -> Result<Config> {
    let mut config = Config::from_file(config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if !overrides.is_empty() {
        config.strategy = config
            .strategy
            .apply_overrides(overrides)
            .context("Invalid parameter override")?;
        info!("Applied {} override(s): {:?}", overrides.len(), overrides);
    }

    Ok(config)
}
