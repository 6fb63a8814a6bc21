//! Signal evaluation
//!
//! Turns one bar's indicator snapshot plus the current position state into
//! a [`Decision`]:
//!
//! ### Entry (long only)
//! flat, close above the regime SMA, sentiment gate open, `z <= -entry_eff`,
//! and outside the post-exit cooldown.
//!
//! ### Exit
//! invested and either `|z| <= exit` or the time stop has been reached.

use crate::config::StrategyParams;
use crate::indicators::IndicatorSnapshot;
use crate::risk::PositionSizer;
use crate::{Decision, ExitReason};

/// Denominator floor for the z-score
pub const STD_FLOOR: f64 = 1e-12;

/// Everything the evaluator reads for one bar
#[derive(Debug, Clone, Copy)]
pub struct SignalInputs {
    pub snapshot: IndicatorSnapshot,
    pub is_invested: bool,
    pub in_cooldown: bool,
    /// Whole days since the entry order was placed
    pub days_in_trade: i64,
    /// Effective sentiment score (0.0 when sentiment is disabled)
    pub sentiment: f64,
}

/// Intermediate values behind a decision, kept for logging and scans
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub z: f64,
    pub entry_eff: f64,
    pub bullish: bool,
    pub gate_ok: bool,
    pub in_cooldown: bool,
    pub decision: Decision,
}

/// z-score signal with regime, cooldown and sentiment gates
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    params: StrategyParams,
}

impl SignalEvaluator {
    pub fn new(params: StrategyParams) -> Self {
        SignalEvaluator { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Sentiment actually used this bar.
    ///
    /// With sentiment disabled this is always 0.0, which turns every
    /// sentiment term into a no-op. Missing or non-finite scores are neutral.
    pub fn effective_sentiment(&self, score: Option<f64>) -> f64 {
        if self.params.use_sentiment {
            score.filter(|s| s.is_finite()).unwrap_or(0.0)
        } else {
            0.0
        }
    }

    pub fn z_score(close: f64, mean: f64, std: f64) -> f64 {
        (close - mean) / std.max(STD_FLOOR)
    }

    /// Entry threshold after sentiment adjustment
    pub fn entry_threshold(&self, sentiment: f64) -> f64 {
        let base = self.params.entry;
        if self.params.use_sentiment {
            (base * (1.0 - self.params.sent_entry_k * sentiment)).clamp(0.5 * base, 2.0 * base)
        } else {
            base
        }
    }

    pub fn gate_ok(&self, sentiment: f64) -> bool {
        if self.params.use_sentiment {
            sentiment >= self.params.sent_gate
        } else {
            true
        }
    }

    pub fn evaluate(&self, inputs: &SignalInputs, sizer: &PositionSizer) -> Evaluation {
        let snap = &inputs.snapshot;
        let s = inputs.sentiment;

        let z = Self::z_score(snap.close, snap.sma, snap.std);
        let bullish = snap.close > snap.regime_sma;
        let gate_ok = self.gate_ok(s);
        let entry_eff = self.entry_threshold(s);

        let enter = !inputs.is_invested
            && bullish
            && gate_ok
            && z <= -entry_eff
            && !inputs.in_cooldown;

        let decision = if enter {
            Decision::EnterLong {
                target_weight: sizer.target_weight(snap, z, entry_eff, s),
            }
        } else if inputs.is_invested {
            if z.abs() <= self.params.exit {
                Decision::ExitLong {
                    reason: ExitReason::MeanReverted,
                }
            } else if inputs.days_in_trade >= self.params.time_stop {
                Decision::ExitLong {
                    reason: ExitReason::TimeStop,
                }
            } else {
                Decision::NoAction
            }
        } else {
            Decision::NoAction
        };

        Evaluation {
            z,
            entry_eff,
            bullish,
            gate_ok,
            in_cooldown: inputs.in_cooldown,
            decision,
        }
    }
}
