//! Error types for the decision core
//!
//! Numeric edge cases are clamped, not raised. These variants cover
//! configuration mistakes and host-boundary contract violations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::oms::{OrderId, OrderRole, OrderStatus};

#[derive(Debug, Error)]
pub enum StrategyError {
    /// Parameter outside its valid domain
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Order event for an id the tracker never submitted
    #[error("Unknown order id: {0}")]
    UnknownOrder(OrderId),

    /// Event role does not match the ticket's role
    #[error("Order {id} is a {expected:?} order, event reported {got:?}")]
    RoleMismatch {
        id: OrderId,
        expected: OrderRole,
        got: OrderRole,
    },

    /// Bar or event older than something already processed
    #[error("Out of order event: last processed {last}, got {got}")]
    OutOfOrderEvent {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    /// Status change not allowed by the order state machine
    #[error("Order {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Indicator construction failure
    #[error("Indicator error: {0}")]
    Indicator(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StrategyError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StrategyError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
