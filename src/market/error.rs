use std::result;

use thiserror::Error;

use crate::util::PanicPayload;

/// Market-data fetch failure. Always recoverable: the engine skips the
/// cycle and retries on the next one.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Market data unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Order-submission failure reported by the executor.
///
/// Every variant leaves the position state machine untouched; the next
/// cycle re-evaluates the unchanged guard condition.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Insufficient balance: required {required:.2}, available {available:.2}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("Order rejected by exchange: {reason}")]
    Rejected { reason: String },

    #[error("Network failure during submission: {reason}")]
    Network { reason: String },
}

#[derive(Error, Debug)]
pub enum DataSourceCallError {
    #[error("`MarketDataSource::get_candles` panicked: {0}")]
    Panicked(PanicPayload),

    #[error(transparent)]
    Source(MarketDataError),
}

pub(crate) type DataSourceCallResult<T> = result::Result<T, DataSourceCallError>;

#[derive(Error, Debug)]
pub enum ExecutorCallError {
    #[error("`OrderExecutor::submit` panicked: {0}")]
    Panicked(PanicPayload),

    #[error("`OrderExecutor::submit` timed out")]
    Timeout,

    #[error(transparent)]
    Execution(ExecutionError),
}

pub(crate) type ExecutorCallResult<T> = result::Result<T, ExecutorCallError>;
