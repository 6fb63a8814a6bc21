//! Integration tests for the mean reversion decision core
//!
//! A scripted host drives the strategy through bars and order events the
//! way a backtest platform would: fills are injected by the test, holdings
//! are updated by hand.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};

use mean_reversion_core::host::{OrderRouter, Portfolio, SizingOracle};
use mean_reversion_core::oms::{OrderEvent, OrderId, OrderRole, OrderStatus};
use mean_reversion_core::risk::PositionSizer;
use mean_reversion_core::{
    Bar, Config, Decision, ExitReason, MeanReversionStrategy, StrategyError, StrategyParams,
};

// =============================================================================
// Test Utilities
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Submitted {
    MarketOnOpen(OrderId, i64),
    Stop(OrderId, i64, f64),
    Cancel(OrderId),
    Liquidate(OrderId),
}

/// Host that records every request; shares per unit weight are fixed
#[derive(Default)]
struct ScriptedHost {
    holdings: i64,
    shares_per_weight: f64,
    next_id: OrderId,
    log: Vec<Submitted>,
}

impl ScriptedHost {
    fn new() -> Self {
        Self {
            shares_per_weight: 1000.0,
            ..Default::default()
        }
    }

    fn entries(&self) -> Vec<i64> {
        self.log
            .iter()
            .filter_map(|s| match s {
                Submitted::MarketOnOpen(_, q) => Some(*q),
                _ => None,
            })
            .collect()
    }

    fn stops(&self) -> Vec<(OrderId, i64, f64)> {
        self.log
            .iter()
            .filter_map(|s| match s {
                Submitted::Stop(id, q, t) => Some((*id, *q, *t)),
                _ => None,
            })
            .collect()
    }

    fn liquidations(&self) -> usize {
        self.log
            .iter()
            .filter(|s| matches!(s, Submitted::Liquidate(_)))
            .count()
    }
}

impl Portfolio for ScriptedHost {
    fn holdings(&self) -> i64 {
        self.holdings
    }
}

impl SizingOracle for ScriptedHost {
    fn calculate_order_quantity(&self, target_weight: f64) -> f64 {
        target_weight * self.shares_per_weight - self.holdings as f64
    }
}

impl OrderRouter for ScriptedHost {
    fn submit_market_on_open(&mut self, quantity: i64) -> OrderId {
        self.next_id += 1;
        self.log.push(Submitted::MarketOnOpen(self.next_id, quantity));
        self.next_id
    }

    fn submit_stop_market(&mut self, quantity: i64, trigger: f64) -> OrderId {
        self.next_id += 1;
        self.log.push(Submitted::Stop(self.next_id, quantity, trigger));
        self.next_id
    }

    fn cancel(&mut self, id: OrderId) {
        self.log.push(Submitted::Cancel(id));
    }

    fn liquidate(&mut self) -> Option<OrderId> {
        if self.holdings == 0 {
            return None;
        }
        self.next_id += 1;
        self.log.push(Submitted::Liquidate(self.next_id));
        Some(self.next_id)
    }
}

fn day(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap() + Duration::days(i)
}

fn make_bar(i: i64, open: f64, close: f64) -> Bar {
    Bar::new(day(i), open, open.max(close) + 0.5, open.min(close) - 0.5, close).unwrap()
}

/// 60 bars of steady uptrend (closes 100..=159) followed by a selloff
fn generate_dip_series() -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..60)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar::new(day(i), close - 0.5, close + 1.0, close - 1.0, close).unwrap()
        })
        .collect();

    let mut prev = 159.0;
    for (i, close) in [(60, 146.0), (61, 145.0), (62, 142.0), (63, 139.0)] {
        bars.push(make_bar(i, prev, close));
        prev = close;
    }
    bars
}

fn test_config() -> Config {
    Config {
        strategy: StrategyParams {
            window: 10,
            reglen: 60,
            entry: 1.5,
            exit: 0.5,
            cooldown: 1,
            time_stop: 3,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn filled(id: OrderId, role: OrderRole, price: f64, quantity: i64, at: DateTime<Utc>) -> OrderEvent {
    OrderEvent {
        order_id: id,
        role,
        status: OrderStatus::Filled,
        fill_price: price,
        fill_quantity: quantity,
        time: at,
    }
}

fn run_until(
    strategy: &mut MeanReversionStrategy,
    host: &mut ScriptedHost,
    bars: &[Bar],
    sentiment: Option<f64>,
) -> Vec<Decision> {
    bars.iter()
        .map(|bar| strategy.on_bar(bar, sentiment, host).unwrap())
        .collect()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_warmup_emits_no_decisions() {
    let bars = generate_dip_series();
    let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host = ScriptedHost::new();

    let decisions = run_until(&mut strategy, &mut host, &bars[..59], None);
    assert!(decisions.iter().all(|d| *d == Decision::NoAction));
    assert!(host.log.is_empty());
}

#[test]
fn test_entry_fill_stop_and_cooldown() {
    let bars = generate_dip_series();
    let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host = ScriptedHost::new();

    run_until(&mut strategy, &mut host, &bars[..60], None);
    let decision = strategy.on_bar(&bars[60], None, &mut host).unwrap();
    assert!(decision.is_entry());
    let entry = host.entries();
    assert_eq!(entry.len(), 1);
    assert!(entry[0] > 0);

    // entry fills at the next open
    let entry_id = strategy.tracker().entry_ticket().unwrap().id;
    host.holdings = entry[0];
    strategy
        .on_order_event(&filled(entry_id, OrderRole::Entry, 146.5, entry[0], day(61)), &mut host)
        .unwrap();

    let atr = strategy.indicators().atr().unwrap();
    let stops = host.stops();
    assert_eq!(stops.len(), 1);
    let (stop_id, stop_qty, trigger) = stops[0];
    assert_eq!(stop_qty, -entry[0]);
    assert_relative_eq!(trigger, 146.5 - 2.5 * atr, epsilon = 1e-9);

    // gap down through the stop
    host.holdings = 0;
    strategy
        .on_order_event(&filled(stop_id, OrderRole::Stop, trigger, -entry[0], day(61)), &mut host)
        .unwrap();
    assert_eq!(strategy.tracker().cooldown().last_exit(), Some(day(61)));

    // still oversold and bullish, but cooling down
    for bar in &bars[61..63] {
        let decision = strategy.on_bar(bar, None, &mut host).unwrap();
        let eval = strategy.last_evaluation().unwrap();
        assert_eq!(decision, Decision::NoAction);
        assert!(eval.in_cooldown);
        assert!(eval.bullish);
        assert!(eval.z <= -eval.entry_eff);
    }
    assert_eq!(host.entries().len(), 1);

    // cooldown elapsed
    let decision = strategy.on_bar(&bars[63], None, &mut host).unwrap();
    assert!(decision.is_entry());
    assert!(!strategy.last_evaluation().unwrap().in_cooldown);
    assert_eq!(host.entries().len(), 2);
}

#[test]
fn test_time_stop_exit() {
    let bars = generate_dip_series();
    let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host = ScriptedHost::new();

    run_until(&mut strategy, &mut host, &bars[..61], None);
    let entry_id = strategy.tracker().entry_ticket().unwrap().id;
    let qty = host.entries()[0];
    host.holdings = qty;
    strategy
        .on_order_event(&filled(entry_id, OrderRole::Entry, 146.5, qty, day(61)), &mut host)
        .unwrap();
    let stop_id = host.stops()[0].0;

    // days 61 and 62: still stretched, too early for the time stop
    for bar in &bars[61..63] {
        assert_eq!(strategy.on_bar(bar, None, &mut host).unwrap(), Decision::NoAction);
        assert!(strategy.last_evaluation().unwrap().z.abs() > 0.5);
    }

    let decision = strategy.on_bar(&bars[63], None, &mut host).unwrap();
    assert_eq!(
        decision,
        Decision::ExitLong {
            reason: ExitReason::TimeStop
        }
    );
    assert!(host.log.contains(&Submitted::Cancel(stop_id)));
    assert_eq!(host.liquidations(), 1);
    assert_eq!(strategy.tracker().cooldown().last_exit(), Some(day(63)));
    assert_eq!(strategy.tracker().position().entry_bar_time, None);
    // no new entry on the exit bar
    assert_eq!(host.entries().len(), 1);
}

#[test]
fn test_repeat_exit_is_harmless() {
    let bars = generate_dip_series();
    let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host = ScriptedHost::new();

    run_until(&mut strategy, &mut host, &bars[..61], None);
    let entry_id = strategy.tracker().entry_ticket().unwrap().id;
    let qty = host.entries()[0];
    host.holdings = qty;
    strategy
        .on_order_event(&filled(entry_id, OrderRole::Entry, 146.5, qty, day(61)), &mut host)
        .unwrap();
    run_until(&mut strategy, &mut host, &bars[61..64], None);
    assert_eq!(host.liquidations(), 1);

    // liquidation not filled yet and price back at the mean: the exit fires
    // again but the stop is not canceled twice
    let next = make_bar(64, 139.0, 150.8);
    let decision = strategy.on_bar(&next, None, &mut host).unwrap();
    assert!(decision.is_exit());
    let cancels = host
        .log
        .iter()
        .filter(|s| matches!(s, Submitted::Cancel(_)))
        .count();
    assert_eq!(cancels, 1);
}

// =============================================================================
// Sentiment
// =============================================================================

#[test]
fn test_sentiment_off_ignores_scores_and_coefficients() {
    let bars = generate_dip_series();

    let mut a = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host_a = ScriptedHost::new();
    let decisions_a = run_until(&mut a, &mut host_a, &bars, None);

    let mut config = test_config();
    config.strategy.sent_gate = 0.9;
    config.strategy.sent_entry_k = 3.0;
    config.strategy.sent_size_k = -2.0;
    let mut b = MeanReversionStrategy::new(&config).unwrap();
    let mut host_b = ScriptedHost::new();
    let decisions_b = run_until(&mut b, &mut host_b, &bars, Some(-0.8));

    assert_eq!(decisions_a, decisions_b);
    assert_eq!(host_a.log, host_b.log);
    assert!(decisions_a.iter().any(|d| d.is_entry()));
}

#[test]
fn test_sentiment_gate_blocks_entry() {
    let bars = generate_dip_series();
    let mut config = test_config();
    config.strategy.use_sentiment = true;

    let mut strategy = MeanReversionStrategy::new(&config).unwrap();
    let mut host = ScriptedHost::new();
    let decisions = run_until(&mut strategy, &mut host, &bars[..61], Some(-0.5));

    assert!(decisions.iter().all(|d| !d.is_entry()));
    assert!(!strategy.last_evaluation().unwrap().gate_ok);
    assert!(host.entries().is_empty());
}

#[test]
fn test_sentiment_scales_size() {
    let bars = generate_dip_series();
    let mut config = test_config();
    config.strategy.use_sentiment = true;

    let mut neutral = MeanReversionStrategy::new(&config).unwrap();
    let mut host_n = ScriptedHost::new();
    run_until(&mut neutral, &mut host_n, &bars[..61], Some(0.0));

    let mut positive = MeanReversionStrategy::new(&config).unwrap();
    let mut host_p = ScriptedHost::new();
    run_until(&mut positive, &mut host_p, &bars[..61], Some(0.4));

    assert_eq!(host_n.entries().len(), 1);
    assert_eq!(host_p.entries().len(), 1);
    assert!(host_p.entries()[0] > host_n.entries()[0]);
}

// =============================================================================
// Determinism and Input Validation
// =============================================================================

#[test]
fn test_replay_is_deterministic() {
    let bars = generate_dip_series();
    let run = || {
        let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
        let mut host = ScriptedHost::new();
        let decisions = run_until(&mut strategy, &mut host, &bars, None);
        (decisions, host.log)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_event_before_last_bar_rejected() {
    let bars = generate_dip_series();
    let mut strategy = MeanReversionStrategy::new(&test_config()).unwrap();
    let mut host = ScriptedHost::new();
    run_until(&mut strategy, &mut host, &bars[..62], None);

    let entry_id = strategy.tracker().entry_ticket().unwrap().id;
    host.holdings = 100;
    let err = strategy
        .on_order_event(&filled(entry_id, OrderRole::Entry, 146.5, 100, day(60)), &mut host)
        .unwrap_err();
    assert!(matches!(err, StrategyError::OutOfOrderEvent { .. }));
    assert!(host.stops().is_empty());
}

#[test]
fn test_high_weight_drops_extra_lot() {
    // target 0.97 with lot 10: 970 shares -> 960
    let sizer = PositionSizer::new(StrategyParams::default(), 10, 0.0);
    let host = ScriptedHost {
        shares_per_weight: 1000.5,
        ..Default::default()
    };
    let sized = sizer.delta_shares(0.97, &host);
    assert_relative_eq!(sized.capped_weight, 0.97);
    assert_eq!(sized.quantity, 960);
}
