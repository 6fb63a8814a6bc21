//! Technical indicators
//!
//! Incremental indicators that advance by one bar in O(1), combined into
//! [`IndicatorSet`], which is what the strategy uses on every bar.
//!
//! SMAs are backed by the `ta` crate. The sample standard deviation and the
//! Wilder ATR are implemented here because `ta` only offers a population
//! deviation and an EMA-smoothed ATR.

use std::collections::VecDeque;

use statrs::statistics::Statistics;
use ta::indicators::SimpleMovingAverage;
use ta::Next;

use crate::config::{StrategyParams, ATR_PERIOD};
use crate::error::{Result, StrategyError};
use crate::Bar;

// =============================================================================
// Incremental Indicators
// =============================================================================

/// Full-window updates between exact recomputations of the running moments
pub const STD_RESYNC_INTERVAL: usize = 1024;

/// Windowed sample standard deviation, O(1) per update.
///
/// Keeps the running mean and sum of squared deviations (Welford) and swaps
/// the oldest sample out once the window is full. Every
/// [`STD_RESYNC_INTERVAL`] swaps the moments are recomputed from the window
/// so rounding error cannot build up over long runs.
#[derive(Debug, Clone)]
pub struct RollingStdDev {
    period: usize,
    window: VecDeque<f64>,
    mean: f64,
    m2: f64,
    since_resync: usize,
}

impl RollingStdDev {
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(StrategyError::Indicator(format!(
                "standard deviation period must be >= 2, got {}",
                period
            )));
        }
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            mean: 0.0,
            m2: 0.0,
            since_resync: 0,
        })
    }

    pub fn next(&mut self, value: f64) -> f64 {
        if self.window.len() < self.period {
            self.window.push_back(value);
            let n = self.window.len() as f64;
            let delta = value - self.mean;
            self.mean += delta / n;
            self.m2 += delta * (value - self.mean);
        } else if let Some(oldest) = self.window.pop_front() {
            self.window.push_back(value);
            let prev_mean = self.mean;
            self.mean += (value - oldest) / self.period as f64;
            self.m2 += (value - oldest) * (value - self.mean + oldest - prev_mean);

            self.since_resync += 1;
            if self.since_resync >= STD_RESYNC_INTERVAL {
                self.resync();
            }
        }
        // rounding can push a flat window slightly negative
        self.m2 = self.m2.max(0.0);
        self.value()
    }

    /// Current deviation; 0.0 until two samples are seen
    pub fn value(&self) -> f64 {
        let n = self.window.len();
        if n < 2 {
            0.0
        } else {
            (self.m2 / (n - 1) as f64).sqrt()
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Recompute mean and squared deviations exactly from the window
    pub fn resync(&mut self) {
        self.since_resync = 0;
        if self.window.len() < 2 {
            return;
        }
        let n = self.window.len() as f64;
        self.mean = self.window.iter().mean();
        self.m2 = self.window.iter().variance() * (n - 1.0);
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.period
    }
}

/// Average True Range with Wilder smoothing, O(1) per update
#[derive(Debug, Clone)]
pub struct WilderAtr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl WilderAtr {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(StrategyError::Indicator("ATR period must be > 0".into()));
        }
        Ok(Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            count: 0,
            value: None,
        })
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let tr = match self.prev_close {
            None => high - low,
            Some(prev) => (high - low)
                .max((high - prev).abs())
                .max((low - prev).abs()),
        };
        self.prev_close = Some(close);
        self.count += 1;

        if self.count < self.period {
            self.seed_sum += tr;
        } else if self.count == self.period {
            self.seed_sum += tr;
            self.value = Some(self.seed_sum / self.period as f64);
        } else if let Some(prev_atr) = self.value {
            self.value = Some((prev_atr * (self.period - 1) as f64 + tr) / self.period as f64);
        }

        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Indicator values for one bar, read by the evaluator and sizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    /// Last close (SMA of period 1)
    pub close: f64,
    pub sma: f64,
    pub std: f64,
    pub regime_sma: f64,
    pub atr: f64,
}

/// All rolling indicators the strategy reads, advanced once per bar
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    window_sma: SimpleMovingAverage,
    regime_sma: SimpleMovingAverage,
    std: RollingStdDev,
    atr: WilderAtr,
    last_close: Option<f64>,
    sma_value: f64,
    regime_value: f64,
    bars_seen: usize,
    warmup: usize,
}

impl IndicatorSet {
    pub fn new(params: &StrategyParams) -> Result<Self> {
        let window_sma = SimpleMovingAverage::new(params.window)
            .map_err(|e| StrategyError::Indicator(format!("window SMA: {:?}", e)))?;
        let regime_sma = SimpleMovingAverage::new(params.reglen)
            .map_err(|e| StrategyError::Indicator(format!("regime SMA: {:?}", e)))?;

        Ok(Self {
            window_sma,
            regime_sma,
            std: RollingStdDev::new(params.window)?,
            atr: WilderAtr::new(ATR_PERIOD)?,
            last_close: None,
            sma_value: 0.0,
            regime_value: 0.0,
            bars_seen: 0,
            warmup: params.warmup_period(),
        })
    }

    /// Advance every indicator by one bar
    pub fn update(&mut self, bar: &Bar) {
        self.sma_value = self.window_sma.next(bar.close);
        self.regime_value = self.regime_sma.next(bar.close);
        self.std.next(bar.close);
        self.atr.next(bar.high, bar.low, bar.close);
        self.last_close = Some(bar.close);
        self.bars_seen += 1;
    }

    pub fn is_ready(&self) -> bool {
        self.bars_seen >= self.warmup
    }

    pub fn warmup_period(&self) -> usize {
        self.warmup
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn atr(&self) -> Option<f64> {
        self.atr.value()
    }

    /// Current values, or `None` while warming up
    pub fn snapshot(&self) -> Option<IndicatorSnapshot> {
        if !self.is_ready() {
            return None;
        }
        Some(IndicatorSnapshot {
            close: self.last_close?,
            sma: self.sma_value,
            std: self.std.value(),
            regime_sma: self.regime_value,
            atr: self.atr.value()?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
