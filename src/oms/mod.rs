//! Order Management System
//!
//! Order tickets, their status state machine, and the tracker that reacts
//! to decisions and host order events.

pub mod tracker;
pub mod types;

pub use tracker::{CooldownTimer, OrderTracker, PositionState};
pub use types::{
    OrderEvent, OrderId, OrderIntent, OrderKind, OrderRole, OrderStatus, OrderTicket,
};
