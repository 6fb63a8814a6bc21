//! Mean Reversion Decision Core
//!
//! A long-only, daily-bar z-score mean reversion strategy for a single
//! symbol: rolling indicators, an entry/exit signal gated by a long-term
//! regime filter and a post-exit cooldown, volatility-targeted sizing, and
//! ATR protective stops.
//!
//! The core owns no data feed, portfolio or broker. A host platform drives
//! it with bars and order events and executes the orders it asks for,
//! through the traits in [`host`].
//!
//! ## Example
//! ```no_run
//! use mean_reversion_core::{Config, MeanReversionStrategy};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("configs/default.json")?;
//!     let strategy = MeanReversionStrategy::new(&config)?;
//!     println!("warm-up: {} bars", strategy.indicators().warmup_period());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod host;
pub mod indicators;
pub mod oms;
pub mod risk;
pub mod signal;
pub mod strategy;
pub mod types;

pub use config::{Config, StrategyParams};
pub use error::{Result, StrategyError};
pub use host::Host;
pub use strategy::MeanReversionStrategy;
pub use types::*;
