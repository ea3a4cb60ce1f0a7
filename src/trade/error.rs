use std::{result, sync::Arc};

use thiserror::Error;

use crate::shared::Lookback;

use super::{process::error::TradeProcessFatalError, state::TradingStatus};

#[derive(Error, Debug)]
pub enum TradeError {
    #[error(
        "Invalid configuration: lookback of {lookback} candles can't cover \
         the {required}-candle indicator warm-up"
    )]
    LookbackBelowWarmup { lookback: Lookback, required: usize },

    #[error("Trading process already shutdown error")]
    AlreadyShutdown,

    #[error("Trading process already terminated error, status: {0}")]
    AlreadyTerminated(TradingStatus),

    #[error("Trading shutdown procedure failed: {0}")]
    ShutdownFailed(Arc<TradeProcessFatalError>),
}

pub(super) type Result<T> = result::Result<T, TradeError>;
