#![doc = include_str!("../README.md")]

/// Exports [`IndicatorEngine`] and the enriched [`IndicatorRow`].
///
/// [`IndicatorEngine`]: crate::indicator::IndicatorEngine
/// [`IndicatorRow`]: crate::indicator::IndicatorRow
pub mod indicator;
/// Exports the [`MarketDataSource`] and [`OrderExecutor`] capabilities,
/// boundary models, and the simulated doubles.
///
/// [`MarketDataSource`]: crate::market::MarketDataSource
/// [`OrderExecutor`]: crate::market::OrderExecutor
pub mod market;
/// Exports [`PositionStateMachine`] and the position model types.
///
/// [`PositionStateMachine`]: crate::position::PositionStateMachine
pub mod position;
mod shared;
/// Exports [`SignalEvaluator`], [`ExtremaTracker`], and the signal types.
///
/// [`SignalEvaluator`]: crate::signal::SignalEvaluator
/// [`ExtremaTracker`]: crate::signal::ExtremaTracker
pub mod signal;
/// Exports [`TradingEngine`], [`TradingController`], and the trading status
/// surface.
///
/// [`TradingEngine`]: crate::trade::TradingEngine
/// [`TradingController`]: crate::trade::TradingController
pub mod trade;
mod util;

/// Error types returned by `spotrev`.
pub mod error {
    pub use super::market::error::{
        DataSourceCallError, ExecutionError, ExecutorCallError, MarketDataError,
    };
    pub use super::shared::error::{
        LookbackValidationError, OperationValueValidationError, PercentValidationError,
        PollIntervalValidationError, SymbolValidationError,
    };
    pub use super::trade::{
        error::TradeError,
        process::error::{TradeProcessError, TradeProcessFatalError, TradeProcessRecoverableError},
    };
    pub use super::util::PanicPayload;

    /// Convenience general-purpose Result type alias.
    pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
}

/// Exports the validated configuration newtypes.
pub mod models {
    pub use super::shared::{
        CandleInterval, Lookback, OperationValue, Percent, PollInterval, Symbol,
    };
}
