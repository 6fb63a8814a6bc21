//! Core data types used across the decision core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar is rejected at construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarValidationError {
    #[error("non-finite or non-positive price in bar at {0}")]
    InvalidPrice(DateTime<Utc>),
    #[error("high {high} below low {low} at {datetime}")]
    HighBelowLow {
        datetime: DateTime<Utc>,
        high: f64,
        low: f64,
    },
    #[error("open/close outside high-low range at {0}")]
    BodyOutsideRange(DateTime<Utc>),
}

/// Daily OHLC bar delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Build a validated bar
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self, BarValidationError> {
        let prices = [open, high, low, close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(BarValidationError::InvalidPrice(datetime));
        }
        if high < low {
            return Err(BarValidationError::HighBelowLow {
                datetime,
                high,
                low,
            });
        }
        if open > high || open < low || close > high || close < low {
            return Err(BarValidationError::BodyOutsideRange(datetime));
        }

        Ok(Bar {
            datetime,
            open,
            high,
            low,
            close,
        })
    }
}

/// Traded symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side implied by a signed share quantity
    pub fn from_quantity(quantity: i64) -> Self {
        if quantity >= 0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}

/// Why a long position is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// |z| came back inside the exit band
    MeanReverted,
    /// Holding period reached the time stop
    TimeStop,
}

/// Per-bar outcome of the signal evaluator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    EnterLong { target_weight: f64 },
    ExitLong { reason: ExitReason },
    NoAction,
}

impl Decision {
    pub fn is_entry(&self) -> bool {
        matches!(self, Decision::EnterLong { .. })
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Decision::ExitLong { .. })
    }
}
