//! Position sizing
//!
//! Volatility-targeted weights converted into lot-rounded share deltas.
//!
//! Weight formula:
//! ```text
//! realized_vol = std / max(sma, 1e-12)
//! w = clamp(vol_target / max(realized_vol, 1e-6), 0, 1)
//!   * clamp(|z| / entry_eff, 0.5, 1.5)
//!   * (1 + sent_size_k * s)          // sentiment mode only
//! w = clamp(w, 0, 1)
//! ```
//!
//! The host turns the capped weight into shares (it knows price, leverage and
//! fees); this module only applies caps, lot rounding and the high-weight
//! cushion around that answer.

use crate::config::StrategyParams;
use crate::host::SizingOracle;
use crate::indicators::IndicatorSnapshot;

/// Fixed cushion below full allocation, on top of the free-cash fraction
pub const FIXED_CUSHION: f64 = 0.002;

/// Weight above which one extra lot is held back
pub const HIGH_WEIGHT_THRESHOLD: f64 = 0.95;

const MEAN_FLOOR: f64 = 1e-12;
const VOL_FLOOR: f64 = 1e-6;
const THRESHOLD_FLOOR: f64 = 1e-6;

/// Result of sizing an entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedOrder {
    /// Weight actually requested from the host after capping
    pub capped_weight: f64,
    /// Signed share delta, a multiple of the lot size
    pub quantity: i64,
}

/// Converts target weights into share quantities
#[derive(Debug, Clone)]
pub struct PositionSizer {
    params: StrategyParams,
    lot_size: i64,
    free_cash_fraction: f64,
}

impl PositionSizer {
    pub fn new(params: StrategyParams, lot_size: i64, free_cash_fraction: f64) -> Self {
        PositionSizer {
            params,
            lot_size: lot_size.max(1),
            free_cash_fraction,
        }
    }

    pub fn lot_size(&self) -> i64 {
        self.lot_size
    }

    /// Highest weight the sizer will ever request
    pub fn weight_cap(&self) -> f64 {
        1.0 - self.free_cash_fraction - FIXED_CUSHION
    }

    /// Target portfolio weight for a new long
    pub fn target_weight(
        &self,
        snapshot: &IndicatorSnapshot,
        z: f64,
        entry_eff: f64,
        sentiment: f64,
    ) -> f64 {
        let realized_vol = snapshot.std / snapshot.sma.max(MEAN_FLOOR);
        let mut w = (self.params.vol_target / realized_vol.max(VOL_FLOOR)).clamp(0.0, 1.0);

        // signal strength, bounded to a 3:1 range
        w *= (z.abs() / entry_eff.max(THRESHOLD_FLOOR)).clamp(0.5, 1.5);

        if self.params.use_sentiment {
            w *= 1.0 + self.params.sent_size_k * sentiment;
        }

        if w.is_nan() {
            return 0.0;
        }
        w.clamp(0.0, 1.0)
    }

    /// Apply the free-cash cap to a weight
    pub fn cap_weight(&self, target_weight: f64) -> f64 {
        let w = if target_weight.is_nan() {
            0.0
        } else {
            target_weight
        };
        0.0f64.max(self.weight_cap().min(w))
    }

    /// Share delta needed to reach `target_weight`, lot-rounded toward zero
    pub fn delta_shares<O: SizingOracle + ?Sized>(
        &self,
        target_weight: f64,
        oracle: &O,
    ) -> SizedOrder {
        let capped_weight = self.cap_weight(target_weight);
        let raw = oracle.calculate_order_quantity(capped_weight);

        let mut quantity = self.round_to_lot(raw);

        if quantity > 0 && capped_weight > HIGH_WEIGHT_THRESHOLD {
            quantity = (quantity - self.lot_size).max(0);
        }

        tracing::debug!(
            target_weight,
            capped_weight,
            raw_quantity = raw,
            quantity,
            lot_size = self.lot_size,
            "Sized entry"
        );

        SizedOrder {
            capped_weight,
            quantity,
        }
    }

    /// Round a raw share count toward zero to a lot multiple
    pub fn round_to_lot(&self, raw: f64) -> i64 {
        if !raw.is_finite() {
            return 0;
        }
        let lot = self.lot_size as f64;
        let lots = (raw.abs() / lot).floor();
        let magnitude = (lots * lot) as i64;
        if raw >= 0.0 {
            magnitude
        } else {
            -magnitude
        }
    }
}
