//! Mean reversion strategy
//!
//! Wires the indicator set, signal evaluator, sizer and order tracker to the
//! host's event stream.
//!
//! ## Per-bar flow
//! 1. Advance indicators (no decision until warm-up completes)
//! 2. Refresh the position from the host portfolio
//! 3. Evaluate: enter when oversold in an uptrend, exit on reversion or time stop
//! 4. Size entries through the host oracle and submit; exits cancel the stop
//!    and liquidate
//!
//! ## Order events
//! Entry fills place an ATR stop below the fill price. Any sell that leaves
//! the book flat starts the cooldown.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{Config, StrategyParams};
use crate::error::{Result, StrategyError};
use crate::host::Host;
use crate::indicators::{IndicatorSet, IndicatorSnapshot};
use crate::oms::{OrderEvent, OrderTracker};
use crate::risk::PositionSizer;
use crate::signal::{Evaluation, SignalEvaluator, SignalInputs};
use crate::{Bar, Decision, Symbol};

/// Long-only z-score mean reversion on a single symbol
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    symbol: Symbol,
    params: StrategyParams,
    indicators: IndicatorSet,
    evaluator: SignalEvaluator,
    sizer: PositionSizer,
    tracker: OrderTracker,
    last_bar_time: Option<DateTime<Utc>>,
    last_evaluation: Option<Evaluation>,
}

impl MeanReversionStrategy {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let params = config.strategy.clone();
        let symbol = config.symbol();

        let strategy = MeanReversionStrategy {
            indicators: IndicatorSet::new(&params)?,
            evaluator: SignalEvaluator::new(params.clone()),
            sizer: PositionSizer::new(params.clone(), config.lot_size, config.free_cash_fraction),
            tracker: OrderTracker::new(symbol.clone(), params.atr_mult),
            symbol,
            params,
            last_bar_time: None,
            last_evaluation: None,
        };

        info!(
            symbol = %strategy.symbol,
            warmup = strategy.indicators.warmup_period(),
            use_sentiment = strategy.params.use_sentiment,
            "Mean reversion strategy initialized"
        );
        Ok(strategy)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn tracker(&self) -> &OrderTracker {
        &self.tracker
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.sizer
    }

    /// Intermediate values of the most recent evaluated bar
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.indicators.is_ready()
    }

    fn accept_bar(&mut self, bar: &Bar) -> Result<()> {
        if let Some(last) = self.last_bar_time {
            if bar.datetime <= last {
                return Err(StrategyError::OutOfOrderEvent {
                    last,
                    got: bar.datetime,
                });
            }
        }
        self.tracker.observe_time(bar.datetime)?;
        self.last_bar_time = Some(bar.datetime);
        Ok(())
    }

    /// Feed a warm-up bar: indicators only, no decisions
    pub fn warm_up(&mut self, bar: &Bar) -> Result<()> {
        self.accept_bar(bar)?;
        self.indicators.update(bar);
        Ok(())
    }

    /// Evaluate a snapshot against the current position and cooldown state
    pub fn evaluate(
        &self,
        snapshot: IndicatorSnapshot,
        now: DateTime<Utc>,
        sentiment: Option<f64>,
    ) -> Evaluation {
        let position = self.tracker.position();
        let inputs = SignalInputs {
            snapshot,
            is_invested: position.is_invested(),
            in_cooldown: self
                .tracker
                .cooldown()
                .is_active(now, self.params.cooldown_duration()),
            days_in_trade: position.days_in_trade(now),
            sentiment: self.evaluator.effective_sentiment(sentiment),
        };
        self.evaluator.evaluate(&inputs, &self.sizer)
    }

    /// Process one bar and act on the decision.
    ///
    /// Returns the decision that was acted on. An entry whose sized delta
    /// comes back non-positive is reported as `NoAction`.
    pub fn on_bar<H: Host + ?Sized>(
        &mut self,
        bar: &Bar,
        sentiment: Option<f64>,
        host: &mut H,
    ) -> Result<Decision> {
        self.accept_bar(bar)?;
        self.indicators.update(bar);

        let Some(snapshot) = self.indicators.snapshot() else {
            debug!(
                bars_seen = self.indicators.bars_seen(),
                warmup = self.indicators.warmup_period(),
                "Warming up"
            );
            return Ok(Decision::NoAction);
        };

        self.tracker.sync_position(&*host);
        let now = bar.datetime;
        let evaluation = self.evaluate(snapshot, now, sentiment);
        self.last_evaluation = Some(evaluation);

        debug!(
            symbol = %self.symbol,
            close = snapshot.close,
            z = evaluation.z,
            entry_eff = evaluation.entry_eff,
            bullish = evaluation.bullish,
            in_cooldown = evaluation.in_cooldown,
            gate_ok = evaluation.gate_ok,
            "Bar evaluated"
        );

        match evaluation.decision {
            Decision::EnterLong { target_weight } => {
                let sized = self.sizer.delta_shares(target_weight, &*host);
                if sized.quantity <= 0 {
                    debug!(target_weight, "Entry sized to zero, skipped");
                    return Ok(Decision::NoAction);
                }
                info!(
                    symbol = %self.symbol,
                    z = evaluation.z,
                    target_weight,
                    capped_weight = sized.capped_weight,
                    quantity = sized.quantity,
                    "Entering long"
                );
                self.tracker.place_entry(sized.quantity, now, host);
            }
            Decision::ExitLong { reason } => {
                info!(
                    symbol = %self.symbol,
                    z = evaluation.z,
                    reason = ?reason,
                    days_in_trade = self.tracker.position().days_in_trade(now),
                    "Exiting long"
                );
                self.tracker.exit(now, host);
            }
            Decision::NoAction => {}
        }

        Ok(evaluation.decision)
    }

    /// Forward a host order event to the tracker
    pub fn on_order_event<H: Host + ?Sized>(
        &mut self,
        event: &OrderEvent,
        host: &mut H,
    ) -> Result<()> {
        let atr = self.indicators.atr();
        self.tracker.on_order_event(event, atr, host)
    }
}
