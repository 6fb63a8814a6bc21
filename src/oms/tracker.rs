//! Order and position state tracking
//!
//! Owns the entry and stop tickets, the position mirror and the cooldown
//! timer. It is the only writer of any of them.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{Result, StrategyError};
use crate::host::{Host, Portfolio};
use crate::oms::types::{OrderEvent, OrderId, OrderIntent, OrderRole, OrderStatus, OrderTicket};
use crate::Symbol;

/// Position as seen by the core
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionState {
    /// Signed share quantity, refreshed from the host
    pub quantity: i64,
    /// When the current entry order was placed
    pub entry_bar_time: Option<DateTime<Utc>>,
}

impl PositionState {
    pub fn is_invested(&self) -> bool {
        self.quantity != 0
    }

    /// Whole days since the entry was placed; 0 when no entry is recorded
    pub fn days_in_trade(&self, now: DateTime<Utc>) -> i64 {
        self.entry_bar_time
            .map(|t| (now - t).num_days())
            .unwrap_or(0)
    }
}

/// Post-exit re-entry suppression
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CooldownTimer {
    last_exit: Option<DateTime<Utc>>,
}

impl CooldownTimer {
    pub fn last_exit(&self) -> Option<DateTime<Utc>> {
        self.last_exit
    }

    pub fn record_exit(&mut self, at: DateTime<Utc>) {
        self.last_exit = Some(at);
    }

    /// True while `now - last_exit <= duration`
    pub fn is_active(&self, now: DateTime<Utc>, duration: Duration) -> bool {
        self.last_exit
            .map(|exit| now - exit <= duration)
            .unwrap_or(false)
    }
}

/// Entry/stop lifecycle and exit bookkeeping
#[derive(Debug, Clone)]
pub struct OrderTracker {
    symbol: Symbol,
    atr_mult: f64,
    orders: HashMap<OrderId, OrderTicket>,
    entry: Option<OrderId>,
    stop: Option<OrderId>,
    position: PositionState,
    cooldown: CooldownTimer,
    last_event_time: Option<DateTime<Utc>>,
}

impl OrderTracker {
    pub fn new(symbol: Symbol, atr_mult: f64) -> Self {
        Self {
            symbol,
            atr_mult,
            orders: HashMap::new(),
            entry: None,
            stop: None,
            position: PositionState::default(),
            cooldown: CooldownTimer::default(),
            last_event_time: None,
        }
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn cooldown(&self) -> &CooldownTimer {
        &self.cooldown
    }

    pub fn ticket(&self, id: OrderId) -> Option<&OrderTicket> {
        self.orders.get(&id)
    }

    pub fn entry_ticket(&self) -> Option<&OrderTicket> {
        self.entry.and_then(|id| self.orders.get(&id))
    }

    pub fn stop_ticket(&self) -> Option<&OrderTicket> {
        self.stop.and_then(|id| self.orders.get(&id))
    }

    /// Refresh the position quantity from the host portfolio
    pub fn sync_position<P: Portfolio + ?Sized>(&mut self, portfolio: &P) {
        self.position.quantity = portfolio.holdings();
    }

    /// Advance the processed-time watermark (bars and events share one clock)
    pub fn observe_time(&mut self, at: DateTime<Utc>) -> Result<()> {
        if let Some(last) = self.last_event_time {
            if at < last {
                return Err(StrategyError::OutOfOrderEvent { last, got: at });
            }
        }
        self.last_event_time = Some(at);
        Ok(())
    }

    fn register(&mut self, id: OrderId, intent: OrderIntent, at: DateTime<Utc>) {
        self.orders.insert(id, OrderTicket::new(id, intent, at));
    }

    /// Cancel a ticket unless it is already done or a cancel is pending
    fn cancel_if_live<H: Host + ?Sized>(&mut self, id: Option<OrderId>, host: &mut H) {
        let Some(id) = id else {
            return;
        };
        if let Some(ticket) = self.orders.get_mut(&id) {
            if ticket.is_live() && !ticket.cancel_requested {
                host.cancel(id);
                ticket.cancel_requested = true;
                debug!(order_id = id, role = ?ticket.role, "Cancel requested");
            }
        }
    }

    /// Replace any working entry with a market-on-open buy of `quantity`
    pub fn place_entry<H: Host + ?Sized>(
        &mut self,
        quantity: i64,
        now: DateTime<Utc>,
        host: &mut H,
    ) -> OrderId {
        self.cancel_if_live(self.entry, host);

        let intent = OrderIntent::entry(self.symbol.clone(), quantity);
        let id = host.submit_market_on_open(quantity);
        self.register(id, intent, now);
        self.entry = Some(id);
        self.position.entry_bar_time = Some(now);

        info!(symbol = %self.symbol, order_id = id, quantity, "Entry order submitted");
        id
    }

    /// Cancel the stop, liquidate, and start the cooldown
    pub fn exit<H: Host + ?Sized>(&mut self, now: DateTime<Utc>, host: &mut H) {
        self.cancel_if_live(self.stop, host);
        self.stop = None;

        if let Some(id) = host.liquidate() {
            self.register(id, OrderIntent::liquidation(self.symbol.clone()), now);
            info!(symbol = %self.symbol, order_id = id, "Liquidation submitted");
        }

        self.cooldown.record_exit(now);
        self.position.entry_bar_time = None;
    }

    /// Apply a host order event.
    ///
    /// Rejected events (unknown id, wrong role, stale time, illegal status
    /// change) leave the tracker untouched.
    pub fn on_order_event<H: Host + ?Sized>(
        &mut self,
        event: &OrderEvent,
        atr: Option<f64>,
        host: &mut H,
    ) -> Result<()> {
        if let Some(last) = self.last_event_time {
            if event.time < last {
                return Err(StrategyError::OutOfOrderEvent {
                    last,
                    got: event.time,
                });
            }
        }

        let ticket = self
            .orders
            .get_mut(&event.order_id)
            .ok_or(StrategyError::UnknownOrder(event.order_id))?;
        if ticket.role != event.role {
            return Err(StrategyError::RoleMismatch {
                id: event.order_id,
                expected: ticket.role,
                got: event.role,
            });
        }
        let status = ticket.status.transition(event.status, event.order_id)?;

        ticket.status = status;
        if event.is_fill() {
            ticket.filled_quantity += event.fill_quantity;
        }
        self.last_event_time = Some(event.time);
        self.sync_position(&*host);

        debug!(
            order_id = event.order_id,
            role = ?event.role,
            status = ?status,
            fill_price = event.fill_price,
            fill_quantity = event.fill_quantity,
            holdings = self.position.quantity,
            "Order event"
        );

        match (event.role, status) {
            (OrderRole::Entry, OrderStatus::Filled) if self.entry == Some(event.order_id) => {
                self.on_entry_filled(event, atr, host);
            }
            (_, OrderStatus::Canceled) => {
                debug!(order_id = event.order_id, role = ?event.role, "Order canceled");
            }
            (_, OrderStatus::Invalid) => {
                warn!(order_id = event.order_id, role = ?event.role, "Order rejected by host");
            }
            _ => {}
        }

        if event.is_fill() && event.fill_quantity < 0 && self.position.quantity == 0 {
            self.cooldown.record_exit(event.time);
            self.position.entry_bar_time = None;
            info!(
                symbol = %self.symbol,
                order_id = event.order_id,
                role = ?event.role,
                fill_price = event.fill_price,
                "Position flat, cooldown started"
            );
        }

        Ok(())
    }

    /// Place (or replace) the protective stop under a filled entry
    fn on_entry_filled<H: Host + ?Sized>(
        &mut self,
        event: &OrderEvent,
        atr: Option<f64>,
        host: &mut H,
    ) {
        let quantity = self.position.quantity;
        if quantity <= 0 {
            return;
        }
        let Some(atr) = atr else {
            warn!(order_id = event.order_id, "Entry filled before ATR is available, no stop placed");
            return;
        };

        let trigger = event.fill_price - self.atr_mult * atr;
        self.cancel_if_live(self.stop, host);

        let intent = OrderIntent::stop(self.symbol.clone(), -quantity, trigger);
        let id = host.submit_stop_market(-quantity, trigger);
        self.register(id, intent, event.time);
        self.stop = Some(id);

        info!(
            symbol = %self.symbol,
            order_id = id,
            quantity = -quantity,
            fill_price = event.fill_price,
            atr,
            trigger,
            "Protective stop submitted"
        );
    }
}
