use std::result;

use thiserror::Error;

use tokio::{
    sync::broadcast::error::{RecvError, SendError},
    task::JoinError,
};

use crate::market::{
    OrderStatus,
    error::{DataSourceCallError, ExecutorCallError},
};

/// Errors the trading process recovers from by restarting the cycle loop
/// after the configured restart interval, with session state intact.
#[derive(Error, Debug)]
pub enum TradeProcessRecoverableError {
    #[error("[MarketData] {0}")]
    MarketData(DataSourceCallError),

    #[error("Insufficient indicator history: got {got} candles, need {required}")]
    InsufficientHistory { got: usize, required: usize },

    #[error("Order submission failed: {0}")]
    Submission(ExecutorCallError),

    #[error("Order not filled, status: {status}")]
    Unfilled { status: OrderStatus },
}

pub(crate) type ProcessRecoverableResult<T> = result::Result<T, TradeProcessRecoverableError>;

#[derive(Error, Debug)]
pub enum TradeProcessFatalError {
    #[error("TaskJoin error {0}")]
    ProcessTaskJoin(JoinError),

    #[error("Shutdown `RecvError` error: {0}")]
    ShutdownSignalRecv(RecvError),

    #[error("Failed to send trading process shutdown request error: {0}")]
    SendShutdownSignalFailed(SendError<()>),

    #[error("Trading shutdown timeout error")]
    ShutdownTimeout,
}

#[derive(Error, Debug)]
pub enum TradeProcessError {
    #[error(transparent)]
    Recoverable(#[from] TradeProcessRecoverableError),

    #[error(transparent)]
    Fatal(#[from] TradeProcessFatalError),
}

pub(crate) type ProcessResult<T> = result::Result<T, TradeProcessError>;
