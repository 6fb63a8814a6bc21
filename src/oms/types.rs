//! Core OMS types
//!
//! Order roles, the order status state machine, intents handed to the host,
//! tickets tracked by the core, and the events the host sends back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategyError};
use crate::{Side, Symbol};

/// Order ID type - assigned by the host
pub type OrderId = u64;

/// Why an order exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderRole {
    /// Opening market-on-open buy
    Entry,
    /// Protective stop placed after the entry fills
    Stop,
    /// Closing order produced by a liquidation
    Liquidation,
}

/// Order state machine
///
/// `Submitted -> PartiallyFilled* -> {Filled | Canceled}`, or
/// `Submitted -> Invalid`. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the host, working
    Submitted,

    /// Some quantity filled, remainder working
    PartiallyFilled,

    /// Completely filled
    Filled,

    /// Cancelled
    Canceled,

    /// Rejected by the host (buying power, bad price, ...)
    Invalid,
}

impl OrderStatus {
    /// Filled, Canceled and Invalid are done and are never canceled again
    pub fn is_terminal(&self) -> bool {
        match self {
            OrderStatus::Submitted | OrderStatus::PartiallyFilled => false,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Invalid => true,
        }
    }

    /// Validate a status change reported for order `id`
    pub fn transition(self, next: OrderStatus, id: OrderId) -> Result<OrderStatus> {
        use OrderStatus::*;

        let allowed = match (self, next) {
            (Submitted, Submitted) => true,
            (Submitted, PartiallyFilled) => true,
            (Submitted, Filled) => true,
            (Submitted, Canceled) => true,
            (Submitted, Invalid) => true,

            (PartiallyFilled, PartiallyFilled) => true,
            (PartiallyFilled, Filled) => true,
            (PartiallyFilled, Canceled) => true,
            (PartiallyFilled, Submitted) => false,
            (PartiallyFilled, Invalid) => false,

            (Filled, _) | (Canceled, _) | (Invalid, _) => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(StrategyError::InvalidTransition {
                id,
                from: self,
                to: next,
            })
        }
    }
}

/// How the host should execute an intent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    MarketOnOpen,
    StopMarket { trigger: f64 },
    Liquidate,
}

/// Order request built by the core and handed straight to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    pub role: OrderRole,
    pub side: Side,
    /// Signed share quantity (0 for liquidations, the host knows the size)
    pub quantity: i64,
    pub kind: OrderKind,
}

impl OrderIntent {
    pub fn entry(symbol: Symbol, quantity: i64) -> Self {
        Self {
            symbol,
            role: OrderRole::Entry,
            side: Side::from_quantity(quantity),
            quantity,
            kind: OrderKind::MarketOnOpen,
        }
    }

    pub fn stop(symbol: Symbol, quantity: i64, trigger: f64) -> Self {
        Self {
            symbol,
            role: OrderRole::Stop,
            side: Side::from_quantity(quantity),
            quantity,
            kind: OrderKind::StopMarket { trigger },
        }
    }

    pub fn liquidation(symbol: Symbol) -> Self {
        Self {
            symbol,
            role: OrderRole::Liquidation,
            side: Side::Sell,
            quantity: 0,
            kind: OrderKind::Liquidate,
        }
    }
}

/// An order the core has submitted and is tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    pub id: OrderId,
    pub role: OrderRole,
    pub status: OrderStatus,
    pub intent: OrderIntent,
    pub submitted_at: DateTime<Utc>,
    /// Cancel sent to the host, confirmation pending
    pub cancel_requested: bool,
    /// Signed quantity filled so far
    pub filled_quantity: i64,
}

impl OrderTicket {
    pub fn new(id: OrderId, intent: OrderIntent, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: intent.role,
            status: OrderStatus::Submitted,
            intent,
            submitted_at,
            cancel_requested: false,
            filled_quantity: 0,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Fill or status update reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub role: OrderRole,
    pub status: OrderStatus,
    pub fill_price: f64,
    /// Signed quantity filled by this event (negative for sells)
    pub fill_quantity: i64,
    pub time: DateTime<Utc>,
}

impl OrderEvent {
    pub fn is_fill(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::PartiallyFilled
        ) && self.fill_quantity != 0
    }
}
