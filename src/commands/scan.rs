//! Scan command implementation
//!
//! Replays bars through the indicators and signal with no position, no
//! orders and no fills. Each ready bar becomes one CSV row on stdout.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mean_reversion_core::{data, MeanReversionStrategy};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ScanRow {
    datetime: DateTime<Utc>,
    close: f64,
    mu: f64,
    sd: f64,
    z: f64,
    entry_eff: f64,
    bullish: bool,
    entry: bool,
    target_weight: f64,
}

pub fn run(
    config_path: String,
    bars_path: String,
    sentiment: Option<f64>,
    overrides: Vec<String>,
) -> Result<()> {
    let config = super::load_config(&config_path, &overrides)?;
    let mut strategy = MeanReversionStrategy::new(&config)?;

    let bars = data::load_csv(&bars_path).context(format!("Failed to load {}", bars_path))?;
    info!("Loaded {} bars from {}", bars.len(), bars_path);
    if bars.len() < strategy.indicators().warmup_period() {
        warn!(
            "Only {} bars, {} needed before the first evaluation",
            bars.len(),
            strategy.indicators().warmup_period()
        );
    }

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    let mut rows = 0usize;
    let mut signals = 0usize;

    for bar in &bars {
        strategy.warm_up(bar)?;
        let Some(snapshot) = strategy.indicators().snapshot() else {
            continue;
        };
        let eval = strategy.evaluate(snapshot, bar.datetime, sentiment);
        let target_weight = match eval.decision {
            mean_reversion_core::Decision::EnterLong { target_weight } => {
                signals += 1;
                target_weight
            }
            _ => 0.0,
        };

        writer.serialize(ScanRow {
            datetime: bar.datetime,
            close: snapshot.close,
            mu: snapshot.sma,
            sd: snapshot.std,
            z: eval.z,
            entry_eff: eval.entry_eff,
            bullish: eval.bullish,
            entry: eval.decision.is_entry(),
            target_weight,
        })?;
        rows += 1;
    }
    writer.flush()?;

    info!("Scanned {} ready bars, {} entry signals", rows, signals);
    Ok(())
}
