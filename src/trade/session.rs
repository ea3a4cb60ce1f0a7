use chrono::Utc;
use tokio::time;

use crate::{
    indicator::IndicatorEngine,
    market::{Candle, TradeRecord, WrappedOrderExecutor},
    position::{PositionSnapshot, PositionStateMachine},
    shared::{OperationValue, Symbol},
    signal::{ExtremaTracker, SignalEvaluator, SignalEvent},
};

use super::{
    config::TradingConfig,
    process::error::{ProcessRecoverableResult, TradeProcessRecoverableError},
};

/// Everything a cycle produced that update subscribers should see.
#[derive(Debug, Default)]
pub(super) struct CycleOutcome {
    /// Signal predicate that fired on the latest row, if any.
    pub signal: Option<SignalEvent>,
    /// Trade-log record of an executed order.
    pub order: Option<TradeRecord>,
    /// Position snapshot after a confirmed fill.
    pub position: Option<PositionSnapshot>,
}

/// Per-engine trading state: the position machine, the extrema of the
/// current hunting phase, and the strategy's evaluator and indicator set.
///
/// The session is the explicit context object every cycle works against;
/// it is owned by the trading process and survives recoverable restarts.
#[derive(Debug)]
pub(super) struct StrategySession {
    symbol: Symbol,
    operation_value: OperationValue,
    indicators: IndicatorEngine,
    evaluator: SignalEvaluator,
    extrema: ExtremaTracker,
    machine: PositionStateMachine,
}

impl StrategySession {
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            symbol: config.symbol().clone(),
            operation_value: config.operation_value(),
            indicators: IndicatorEngine::new(),
            evaluator: config.evaluator(),
            extrema: ExtremaTracker::new(),
            machine: PositionStateMachine::new(config.into()),
        }
    }

    #[cfg(test)]
    pub fn machine(&self) -> &PositionStateMachine {
        &self.machine
    }

    /// Runs one risk/signal evaluation over the fetched candles and submits
    /// at most one order.
    ///
    /// Risk exits are checked before signal exits; the extrema only extend
    /// while hunting (flat). A submission failure, timeout, or non-filled
    /// result surfaces as a recoverable error and leaves the machine and
    /// extrema untouched, so the unchanged guard re-fires next cycle.
    pub async fn evaluate_cycle(
        &mut self,
        candles: &[Candle],
        executor: &WrappedOrderExecutor,
        order_timeout: time::Duration,
    ) -> ProcessRecoverableResult<CycleOutcome> {
        let required = IndicatorEngine::warmup_candles();
        if candles.len() < required {
            return Err(TradeProcessRecoverableError::InsufficientHistory {
                got: candles.len(),
                required,
            });
        }

        let rows = self.indicators.enrich(candles);
        let row = rows.last().expect("series length checked above");
        let close = row.close;

        let extrema = if self.machine.position().is_flat() {
            self.extrema.update(candles)
        } else {
            None
        };

        let mut outcome = CycleOutcome::default();

        // Risk gate first; only if it stays silent may a signal act.
        let intent = match self.machine.risk_exit(close) {
            Some((intent, _trigger)) => Some(intent),
            None => match self.evaluator.evaluate(row, self.machine.position(), extrema) {
                Some(action) => {
                    outcome.signal = Some(SignalEvent {
                        time: row.open_time,
                        action,
                        close,
                        rsi14: row.rsi14.expect("row is warmed up"),
                        ema100: row.ema100,
                    });

                    self.machine.intent_for(action)
                }
                None => None,
            },
        };

        let Some(intent) = intent else {
            return Ok(outcome);
        };

        // Exits reuse the entry sizing rule on the current close, so a
        // moved price under- or over-closes the held quantity. Kept to
        // match the reference behavior; see DESIGN.md.
        let quantity = self.operation_value.quantity_at(close);

        let result = executor
            .submit(intent.order_side(), &self.symbol, quantity, order_timeout)
            .await
            .map_err(TradeProcessRecoverableError::Submission)?;

        if !result.is_filled() {
            return Err(TradeProcessRecoverableError::Unfilled {
                status: result.status,
            });
        }

        let now = Utc::now();
        self.machine.apply_fill(intent, close, now);

        // A confirmed fill starts the next hunting phase from scratch.
        self.extrema = ExtremaTracker::new();

        outcome.order = Some(TradeRecord {
            time: now,
            side: intent.order_side(),
            symbol: self.symbol.clone(),
            quantity,
            price: result.fill_price,
        });
        outcome.position = Some(self.machine.snapshot());

        Ok(outcome)
    }
}
