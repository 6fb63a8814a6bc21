//! Host platform seam
//!
//! The backtest or live host implements these traits. The core never talks
//! to a broker or a data feed directly; it only calls through here.

use crate::oms::OrderId;

/// Portfolio queries for the traded symbol
pub trait Portfolio {
    /// Signed share quantity currently held
    fn holdings(&self) -> i64;
}

/// Buying-power aware sizing, opaque to the core
pub trait SizingOracle {
    /// Signed (possibly fractional) share quantity needed to move the
    /// symbol to `target_weight` of portfolio value, given current holdings.
    fn calculate_order_quantity(&self, target_weight: f64) -> f64;
}

/// Order submission primitives
pub trait OrderRouter {
    /// Market order filled at the next session open
    fn submit_market_on_open(&mut self, quantity: i64) -> OrderId;

    /// Stop-market order triggered at `trigger`
    fn submit_stop_market(&mut self, quantity: i64, trigger: f64) -> OrderId;

    /// Request cancellation; the outcome arrives as an order event
    fn cancel(&mut self, id: OrderId);

    /// Close the whole position. Returns the closing order, if one was needed.
    fn liquidate(&mut self) -> Option<OrderId>;
}

/// Everything the strategy needs from its host
pub trait Host: Portfolio + SizingOracle + OrderRouter {}

impl<T: Portfolio + SizingOracle + OrderRouter> Host for T {}
