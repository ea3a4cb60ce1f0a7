use thiserror::Error;

use super::{Lookback, PollInterval, Symbol};

#[derive(Error, Debug)]
pub enum SymbolValidationError {
    #[error("Invalid symbol, must not be empty")]
    Empty,

    #[error(
        "Invalid symbol, must be at most {} characters, got {len}",
        Symbol::MAX_LEN
    )]
    TooLong { len: usize },

    #[error("Invalid symbol `{symbol}`, must be uppercase ASCII alphanumeric")]
    InvalidCharacters { symbol: String },
}

#[derive(Error, Debug)]
pub enum LookbackValidationError {
    #[error("Invalid lookback, must be at least {} candles", Lookback::MIN)]
    TooShort,

    #[error("Invalid lookback, must be at most {} candles", Lookback::MAX)]
    TooLong,
}

#[derive(Error, Debug)]
pub enum PollIntervalValidationError {
    #[error("Invalid poll interval, must be at least {}", PollInterval::MIN)]
    TooShort,

    #[error("Invalid poll interval, must be at most {}", PollInterval::MAX)]
    TooLong,
}

#[derive(Error, Debug)]
pub enum PercentValidationError {
    #[error("Invalid percent, must be finite")]
    NotFinite,

    #[error("Invalid percent {value}, must be greater than zero")]
    NotPositive { value: f64 },

    #[error("Invalid percent {value}, must be below 1.0 (100%)")]
    NotBelowOne { value: f64 },
}

#[derive(Error, Debug)]
pub enum OperationValueValidationError {
    #[error("Invalid operation value, must be finite")]
    NotFinite,

    #[error("Invalid operation value {value}, must be greater than zero")]
    NotPositive { value: f64 },
}
