use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::time;
use uuid::Uuid;

use crate::{
    shared::{CandleInterval, Lookback, Symbol},
    util::DateTimeExt,
};

pub mod error;
pub mod sim;

use error::{
    DataSourceCallError, DataSourceCallResult, ExecutionError, ExecutorCallError,
    ExecutorCallResult, MarketDataError,
};

/// A single OHLC candlestick as reported by the market-data source.
///
/// Candle sequences handed to the engine are ordered by `open_time`, strictly
/// increasing, with no duplicates. Candles are never mutated once received.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    #[cfg(test)]
    pub(crate) fn new_simple(open_time: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// Returns a formatted string representation of the candle data for display purposes.
    pub fn as_data_str(&self) -> String {
        let time_str = self.open_time.format_local_secs();

        format!(
            "open_time: {time_str}\n\
             open: {:.2}\n\
             high: {:.2}\n\
             low: {:.2}\n\
             close: {:.2}\n\
             volume: {:.4}",
            self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl fmt::Display for Candle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candle:")?;
        for line in self.as_data_str().lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Side of a market order at the exchange boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Final status reported by the executor for a submitted order.
///
/// Anything other than [`Filled`](Self::Filled) is treated like a submission
/// failure by the position engine: no state transition takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Filled,
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filled => write!(f, "filled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A single fill reported by the exchange for a market order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub price: f64,
    pub quantity: f64,
}

/// Result of a market-order submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    /// Exchange-assigned order identifier.
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// Average fill price across `fills`; meaningful only when filled.
    pub fill_price: f64,
    pub fills: Vec<OrderFill>,
}

impl OrderResult {
    /// Returns `true` if the order was completely filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

/// An executed trade as written to the observability sink.
///
/// Carries exactly the fields the trade log records: timestamp, side,
/// symbol, quantity, and the exchange-reported fill price.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub time: DateTime<Utc>,
    pub side: OrderSide,
    pub symbol: Symbol,
    pub quantity: f64,
    pub price: f64,
}

impl TradeRecord {
    /// Returns a formatted string representation of the trade for display purposes.
    pub fn as_data_str(&self) -> String {
        format!(
            "time: {}\n\
             side: {}\n\
             symbol: {}\n\
             quantity: {:.8}\n\
             price: {:.2}",
            self.time.format_local_secs(),
            self.side,
            self.symbol,
            self.quantity,
            self.price
        )
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trade:")?;
        for line in self.as_data_str().lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Capability for fetching candle series from an exchange or a replayed
/// history.
///
/// Implementations must return candles ordered by `open_time`, strictly
/// increasing, most recent last. A network or API failure is reported as
/// [`MarketDataError::Unavailable`]; the engine skips the cycle and retries
/// on the next one.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches up to `limit` of the most recent candles for `symbol` at the
    /// given interval.
    async fn get_candles(
        &self,
        symbol: &Symbol,
        interval: CandleInterval,
        limit: Lookback,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Capability for submitting market orders.
///
/// `submit` must behave atomically from the engine's point of view: it
/// either returns a confirmed [`OrderResult`] or fails, never a partial
/// state the engine has to reconcile.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Submits a market order for `quantity` of the base asset.
    async fn submit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: f64,
    ) -> Result<OrderResult, ExecutionError>;
}

/// Internal wrapper that provides panic protection for market-data sources.
pub(crate) struct WrappedMarketDataSource(Arc<dyn MarketDataSource>);

impl WrappedMarketDataSource {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self(source)
    }

    /// Fetches candles with panic protection.
    pub async fn get_candles(
        &self,
        symbol: &Symbol,
        interval: CandleInterval,
        limit: Lookback,
    ) -> DataSourceCallResult<Vec<Candle>> {
        FutureExt::catch_unwind(AssertUnwindSafe(self.0.get_candles(symbol, interval, limit)))
            .await
            .map_err(|e| DataSourceCallError::Panicked(e.into()))?
            .map_err(DataSourceCallError::Source)
    }
}

/// Internal wrapper that provides panic protection and a submission timeout
/// for order executors.
///
/// A submission that exceeds the timeout is reported as a failure; the
/// position engine treats it exactly like a rejected order and re-evaluates
/// the unchanged guard condition on the next cycle.
pub(crate) struct WrappedOrderExecutor(Arc<dyn OrderExecutor>);

impl WrappedOrderExecutor {
    pub fn new(executor: Arc<dyn OrderExecutor>) -> Self {
        Self(executor)
    }

    /// Submits an order with panic protection, bounded by `timeout`.
    pub async fn submit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: f64,
        timeout: time::Duration,
    ) -> ExecutorCallResult<OrderResult> {
        let submit_protected =
            FutureExt::catch_unwind(AssertUnwindSafe(self.0.submit(side, symbol, quantity)));

        time::timeout(timeout, submit_protected)
            .await
            .map_err(|_| ExecutorCallError::Timeout)?
            .map_err(|e| ExecutorCallError::Panicked(e.into()))?
            .map_err(ExecutorCallError::Execution)
    }
}
