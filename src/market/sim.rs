use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::shared::{CandleInterval, Lookback, Symbol};

use super::{
    Candle, MarketDataSource, OrderExecutor, OrderFill, OrderResult, OrderSide, OrderStatus,
    TradeRecord,
    error::{ExecutionError, MarketDataError},
};

/// Market-data source that replays a fixed candle series one candle per
/// call.
///
/// The first call returns the `limit` oldest candles; every later call
/// reveals one more candle, simulating a live feed where each polling cycle
/// observes a new close. Once the series is exhausted every call reports
/// [`MarketDataError::Unavailable`].
#[derive(Debug)]
pub struct ReplayMarketData {
    candles: Vec<Candle>,
    /// Index one past the most recent visible candle; `None` until the
    /// first call fixes the initial window.
    cursor: Mutex<Option<usize>>,
}

impl ReplayMarketData {
    /// Creates a replay source over the given candle series.
    ///
    /// The series must be ordered by `open_time`, strictly increasing.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            cursor: Mutex::new(None),
        }
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Option<usize>> {
        self.cursor
            .lock()
            .expect("`ReplayMarketData` mutex can't be poisoned")
    }
}

#[async_trait]
impl MarketDataSource for ReplayMarketData {
    async fn get_candles(
        &self,
        _symbol: &Symbol,
        _interval: CandleInterval,
        limit: Lookback,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let mut cursor_guard = self.lock_cursor();

        let cursor = match *cursor_guard {
            None => limit.as_usize().min(self.candles.len()),
            Some(prev) => prev + 1,
        };

        if cursor > self.candles.len() {
            return Err(MarketDataError::Unavailable {
                reason: "replay series exhausted".to_string(),
            });
        }

        *cursor_guard = Some(cursor);

        let start = cursor.saturating_sub(limit.as_usize());
        Ok(self.candles[start..cursor].to_vec())
    }
}

/// Failure injected into the next [`SimulatedOrderExecutor::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// `submit` fails with [`ExecutionError::InsufficientBalance`].
    InsufficientBalance,
    /// `submit` fails with [`ExecutionError::Rejected`].
    Rejected,
    /// `submit` fails with [`ExecutionError::Network`].
    Network,
    /// `submit` succeeds but reports a non-filled [`OrderResult`].
    UnfilledResult,
}

#[derive(Debug)]
struct SimulatedExecutorState {
    market_price: f64,
    inject: Option<InjectedFailure>,
    fills: Vec<TradeRecord>,
}

/// Order executor that fills market orders at a settable market price.
///
/// Fills are recorded and can be inspected after a run. A single failure can
/// be injected ahead of the next submission to exercise the engine's
/// no-transition-on-failure behavior.
#[derive(Debug)]
pub struct SimulatedOrderExecutor {
    state: Mutex<SimulatedExecutorState>,
}

impl SimulatedOrderExecutor {
    /// Creates an executor filling at `market_price`.
    pub fn new(market_price: f64) -> Self {
        Self {
            state: Mutex::new(SimulatedExecutorState {
                market_price,
                inject: None,
                fills: Vec::new(),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SimulatedExecutorState> {
        self.state
            .lock()
            .expect("`SimulatedOrderExecutor` mutex can't be poisoned")
    }

    /// Updates the price the next fills execute at.
    pub fn set_market_price(&self, price: f64) {
        self.lock_state().market_price = price;
    }

    /// Injects a failure into the next `submit` call. Cleared once consumed.
    pub fn inject_failure(&self, failure: InjectedFailure) {
        self.lock_state().inject = Some(failure);
    }

    /// Returns the trades filled so far, oldest first.
    pub fn fills(&self) -> Vec<TradeRecord> {
        self.lock_state().fills.clone()
    }
}

#[async_trait]
impl OrderExecutor for SimulatedOrderExecutor {
    async fn submit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: f64,
    ) -> Result<OrderResult, ExecutionError> {
        let mut state = self.lock_state();

        if let Some(failure) = state.inject.take() {
            match failure {
                InjectedFailure::InsufficientBalance => {
                    return Err(ExecutionError::InsufficientBalance {
                        required: quantity * state.market_price,
                        available: 0.0,
                    });
                }
                InjectedFailure::Rejected => {
                    return Err(ExecutionError::Rejected {
                        reason: "injected rejection".to_string(),
                    });
                }
                InjectedFailure::Network => {
                    return Err(ExecutionError::Network {
                        reason: "injected network failure".to_string(),
                    });
                }
                InjectedFailure::UnfilledResult => {
                    return Ok(OrderResult {
                        order_id: Uuid::new_v4(),
                        status: OrderStatus::Rejected,
                        fill_price: 0.0,
                        fills: Vec::new(),
                    });
                }
            }
        }

        let fill_price = state.market_price;

        state.fills.push(TradeRecord {
            time: Utc::now(),
            side,
            symbol: symbol.clone(),
            quantity,
            price: fill_price,
        });

        Ok(OrderResult {
            order_id: Uuid::new_v4(),
            status: OrderStatus::Filled,
            fill_price,
            fills: vec![OrderFill {
                price: fill_price,
                quantity,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone, Utc};

    fn series(len: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                Candle::new_simple(
                    start + Duration::minutes(i as i64),
                    100.0 + i as f64,
                    1_000.0,
                )
            })
            .collect()
    }

    fn symbol() -> Symbol {
        Symbol::try_from("BTCUSDT").unwrap()
    }

    #[tokio::test]
    async fn replay_reveals_one_candle_per_call() {
        let source = ReplayMarketData::new(series(32));
        let limit = Lookback::try_from(30u64).unwrap();

        let first = source
            .get_candles(&symbol(), CandleInterval::OneMinute, limit)
            .await
            .unwrap();
        assert_eq!(first.len(), 30);
        assert_eq!(first.last().unwrap().close, 129.0);

        let second = source
            .get_candles(&symbol(), CandleInterval::OneMinute, limit)
            .await
            .unwrap();
        assert_eq!(second.len(), 30);
        assert_eq!(second.last().unwrap().close, 130.0);

        let third = source
            .get_candles(&symbol(), CandleInterval::OneMinute, limit)
            .await
            .unwrap();
        assert_eq!(third.last().unwrap().close, 131.0);

        let exhausted = source
            .get_candles(&symbol(), CandleInterval::OneMinute, limit)
            .await;
        assert!(matches!(
            exhausted,
            Err(MarketDataError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn simulated_executor_fills_at_market_price() {
        let executor = SimulatedOrderExecutor::new(50_000.0);

        let result = executor
            .submit(OrderSide::Buy, &symbol(), 0.002)
            .await
            .unwrap();

        assert!(result.is_filled());
        assert_eq!(result.fill_price, 50_000.0);
        assert_eq!(result.fills.len(), 1);

        executor.set_market_price(51_000.0);
        let result = executor
            .submit(OrderSide::Sell, &symbol(), 0.002)
            .await
            .unwrap();
        assert_eq!(result.fill_price, 51_000.0);

        let fills = executor.fills();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].side, OrderSide::Buy);
        assert_eq!(fills[1].side, OrderSide::Sell);
    }

    #[tokio::test]
    async fn injected_failures_are_one_shot() {
        let executor = SimulatedOrderExecutor::new(50_000.0);

        executor.inject_failure(InjectedFailure::Rejected);
        let rejected = executor.submit(OrderSide::Buy, &symbol(), 0.002).await;
        assert!(matches!(rejected, Err(ExecutionError::Rejected { .. })));
        assert!(executor.fills().is_empty());

        executor.inject_failure(InjectedFailure::UnfilledResult);
        let unfilled = executor
            .submit(OrderSide::Buy, &symbol(), 0.002)
            .await
            .unwrap();
        assert!(!unfilled.is_filled());
        assert!(executor.fills().is_empty());

        let filled = executor
            .submit(OrderSide::Buy, &symbol(), 0.002)
            .await
            .unwrap();
        assert!(filled.is_filled());
        assert_eq!(executor.fills().len(), 1);
    }
}
