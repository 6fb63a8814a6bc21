//! Configuration management
//!
//! Run parameters and symbol properties, loaded from a JSON file and
//! optionally overridden by `key=value` pairs (the host's parameter
//! surface, or `-O` on the command line).

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::StrategyError;
use crate::Symbol;

/// Minimum warm-up length regardless of indicator periods
pub const MIN_WARMUP_BARS: usize = 20;

/// ATR period (Wilder smoothing)
pub const ATR_PERIOD: usize = 14;

/// Longest indicator lookback accepted, in bars (about 40 years of sessions)
pub const MAX_LOOKBACK_BARS: usize = 10_000;

/// Longest cooldown or time stop accepted, in days
pub const MAX_HOLD_DAYS: i64 = 3_650;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Minimum tradable share increment
    #[serde(default = "default_lot_size")]
    pub lot_size: i64,
    /// Fraction of portfolio value kept as idle cash
    #[serde(default = "default_free_cash_fraction")]
    pub free_cash_fraction: f64,
    #[serde(default)]
    pub strategy: StrategyParams,
}

fn default_symbol() -> String {
    "SPY".to_string()
}

fn default_lot_size() -> i64 {
    1
}

fn default_free_cash_fraction() -> f64 {
    0.01
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.symbol.clone())
    }

    pub fn validate(&self) -> std::result::Result<(), StrategyError> {
        if self.lot_size < 1 {
            return Err(StrategyError::invalid_parameter("lot_size", "must be >= 1"));
        }
        if !(0.0..1.0).contains(&self.free_cash_fraction) {
            return Err(StrategyError::invalid_parameter(
                "free_cash_fraction",
                "must be in [0, 1)",
            ));
        }
        self.strategy.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            symbol: default_symbol(),
            lot_size: default_lot_size(),
            free_cash_fraction: default_free_cash_fraction(),
            strategy: StrategyParams::default(),
        }
    }
}

/// Strategy parameters, immutable for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// SMA/STD lookback (default: 20)
    pub window: usize,
    /// z-score magnitude to enter long (default: 2.0)
    pub entry: f64,
    /// |z| at or below which the position exits (default: 1.0)
    pub exit: f64,
    /// Stop distance in ATR units (default: 2.5)
    pub atr_mult: f64,
    /// Target daily volatility (default: 0.01)
    pub vol_target: f64,
    /// Days after an exit before re-entry is allowed (default: 3)
    pub cooldown: i64,
    /// Regime SMA length (default: 200)
    pub reglen: usize,
    /// Maximum days held (default: 15)
    pub time_stop: i64,

    // === Sentiment (off by default) ===
    #[serde(deserialize_with = "bool_or_int")]
    pub use_sentiment: bool,
    pub sent_gate: f64,
    pub sent_entry_k: f64,
    pub sent_size_k: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            window: 20,
            entry: 2.0,
            exit: 1.0,
            atr_mult: 2.5,
            vol_target: 0.01,
            cooldown: 3,
            reglen: 200,
            time_stop: 15,
            use_sentiment: false,
            sent_gate: -0.10,
            sent_entry_k: 0.25,
            sent_size_k: 0.25,
        }
    }
}

/// Accepts `true`/`false` as well as the host's integer flags `0`/`1`
fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
    }
}

impl StrategyParams {
    /// Bars of history required before the first decision
    pub fn warmup_period(&self) -> usize {
        self.window.max(self.reglen).max(MIN_WARMUP_BARS)
    }

    pub fn cooldown_duration(&self) -> Duration {
        Duration::try_days(self.cooldown).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> std::result::Result<(), StrategyError> {
        if !(2..=MAX_LOOKBACK_BARS).contains(&self.window) {
            return Err(StrategyError::invalid_parameter(
                "window",
                format!("must be in [2, {}]", MAX_LOOKBACK_BARS),
            ));
        }
        if !(1..=MAX_LOOKBACK_BARS).contains(&self.reglen) {
            return Err(StrategyError::invalid_parameter(
                "reglen",
                format!("must be in [1, {}]", MAX_LOOKBACK_BARS),
            ));
        }
        for (name, value) in [
            ("entry", self.entry),
            ("atr_mult", self.atr_mult),
            ("vol_target", self.vol_target),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(StrategyError::invalid_parameter(name, "must be > 0"));
            }
        }
        if !self.exit.is_finite() || self.exit < 0.0 {
            return Err(StrategyError::invalid_parameter("exit", "must be >= 0"));
        }
        for (name, value) in [("cooldown", self.cooldown), ("time_stop", self.time_stop)] {
            if !(0..=MAX_HOLD_DAYS).contains(&value) {
                return Err(StrategyError::invalid_parameter(
                    name,
                    format!("must be in [0, {}] days", MAX_HOLD_DAYS),
                ));
            }
        }
        for (name, value) in [
            ("sent_gate", self.sent_gate),
            ("sent_entry_k", self.sent_entry_k),
            ("sent_size_k", self.sent_size_k),
        ] {
            if !value.is_finite() {
                return Err(StrategyError::invalid_parameter(name, "must be finite"));
            }
        }
        Ok(())
    }

    /// Apply `key=value` overrides and re-validate.
    ///
    /// Values are parsed as JSON scalars first (`20`, `2.5`, `true`), so the
    /// same strings an optimizer passes to the host work here.
    pub fn apply_overrides<S: AsRef<str>>(
        &self,
        overrides: &[S],
    ) -> std::result::Result<Self, StrategyError> {
        let mut value = serde_json::to_value(self)?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| StrategyError::invalid_parameter("strategy", "not an object"))?;

        for raw in overrides {
            let raw = raw.as_ref();
            let (key, val) = raw.split_once('=').ok_or_else(|| {
                StrategyError::invalid_parameter(raw, "expected key=value")
            })?;
            let key = key.trim();
            if !obj.contains_key(key) {
                return Err(StrategyError::invalid_parameter(key, "unknown parameter"));
            }
            let parsed = serde_json::from_str::<serde_json::Value>(val.trim())
                .unwrap_or_else(|_| serde_json::Value::String(val.trim().to_string()));
            obj.insert(key.to_string(), parsed);
        }

        let params: StrategyParams = serde_json::from_value(value)?;
        params.validate()?;
        Ok(params)
    }
}
