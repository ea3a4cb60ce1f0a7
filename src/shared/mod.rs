use std::{cmp::Ordering, fmt, result::Result};

use chrono::Duration;

pub mod error;

use error::{
    LookbackValidationError, OperationValueValidationError, PercentValidationError,
    PollIntervalValidationError, SymbolValidationError,
};

/// Supported candle resolutions for market-data requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleInterval {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl CandleInterval {
    /// Returns the interval duration in minutes.
    pub const fn as_minutes(&self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::ThreeMinutes => 3,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::FourHours => 240,
            Self::OneDay => 1440,
        }
    }

    /// Returns the interval duration in seconds.
    pub const fn as_seconds(&self) -> u32 {
        self.as_minutes() * 60
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneMinute => write!(f, "1m"),
            Self::ThreeMinutes => write!(f, "3m"),
            Self::FiveMinutes => write!(f, "5m"),
            Self::FifteenMinutes => write!(f, "15m"),
            Self::ThirtyMinutes => write!(f, "30m"),
            Self::OneHour => write!(f, "1h"),
            Self::FourHours => write!(f, "4h"),
            Self::OneDay => write!(f, "1d"),
        }
    }
}

/// Validated trading-pair code, e.g. `BTCUSDT`.
///
/// Symbols must be 1 to 20 uppercase ASCII alphanumeric characters. The
/// engine treats the code as opaque; validation only rejects values no spot
/// exchange would accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub const MAX_LEN: usize = 20;

    /// Returns the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Symbol {
    type Error = SymbolValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(SymbolValidationError::Empty);
        }

        if value.len() > Self::MAX_LEN {
            return Err(SymbolValidationError::TooLong {
                len: value.len(),
            });
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(SymbolValidationError::InvalidCharacters {
                symbol: value.to_string(),
            });
        }

        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated number of candles fetched per polling cycle.
///
/// Must cover the indicator warm-up of the configured strategy; the trading
/// engine checks that at construction time. Bounds here only keep requests
/// within what candle endpoints serve in a single page.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord)]
pub struct Lookback(u64);

impl Lookback {
    /// Minimum lookback: 5 candles.
    pub const MIN: Self = Self(5);

    /// Maximum lookback: 1000 candles.
    pub const MAX: Self = Self(1000);

    /// Returns the lookback as a [`Duration`] for the given candle interval.
    pub fn as_duration(&self, interval: CandleInterval) -> Duration {
        Duration::minutes(self.0 as i64 * interval.as_minutes() as i64)
    }

    /// Returns the number of candles as a `u64`.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the number of candles as a `usize`.
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u64> for Lookback {
    type Error = LookbackValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value < Self::MIN.0 {
            return Err(LookbackValidationError::TooShort);
        }

        if value > Self::MAX.0 {
            return Err(LookbackValidationError::TooLong);
        }

        Ok(Self(value))
    }
}

impl TryFrom<u32> for Lookback {
    type Error = LookbackValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_from(value as u64)
    }
}

impl TryFrom<usize> for Lookback {
    type Error = LookbackValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::try_from(value as u64)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated delay between successive polling cycles.
///
/// Bounded to keep the engine from hammering the market-data endpoint and
/// from going stale between checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord)]
pub struct PollInterval(Duration);

impl PollInterval {
    pub const MIN: Self = Self(Duration::seconds(5));

    pub const MAX: Self = Self(Duration::minutes(10));

    pub fn seconds(secs: u64) -> Result<Self, PollIntervalValidationError> {
        Self::try_from(Duration::seconds(secs as i64))
    }

    /// Returns the poll interval as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl TryFrom<Duration> for PollInterval {
    type Error = PollIntervalValidationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value < Self::MIN.0 {
            return Err(PollIntervalValidationError::TooShort);
        }

        if value > Self::MAX.0 {
            return Err(PollIntervalValidationError::TooLong);
        }

        Ok(Self(value))
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated fraction in the open interval (0, 1).
///
/// Used for stop-loss and take-profit distances and for the evaluator's
/// pullback / minimum-profit thresholds. Stored as a plain fraction
/// (`0.05` = 5%), displayed as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    /// Returns the fraction as an `f64` (`0.05` for 5%).
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Percent {
    type Error = PercentValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PercentValidationError::NotFinite);
        }

        if value <= 0.0 {
            return Err(PercentValidationError::NotPositive { value });
        }

        if value >= 1.0 {
            return Err(PercentValidationError::NotBelowOne { value });
        }

        Ok(Self(value))
    }
}

impl From<Percent> for f64 {
    fn from(value: Percent) -> f64 {
        value.0
    }
}

impl Eq for Percent {}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).expect("`Percent` must be finite")
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

/// Validated quote-currency notional committed per order.
///
/// Order quantity is derived as `operation_value / close` at submission
/// time, so this must be a positive finite amount in the pair's quote
/// currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct OperationValue(f64);

impl OperationValue {
    /// Returns the notional amount as an `f64`.
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Derives the base-asset order quantity at the given price.
    pub fn quantity_at(&self, price: f64) -> f64 {
        self.0 / price
    }
}

impl TryFrom<f64> for OperationValue {
    type Error = OperationValueValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(OperationValueValidationError::NotFinite);
        }

        if value <= 0.0 {
            return Err(OperationValueValidationError::NotPositive { value });
        }

        Ok(Self(value))
    }
}

impl From<OperationValue> for f64 {
    fn from(value: OperationValue) -> f64 {
        value.0
    }
}

impl Eq for OperationValue {}

impl Ord for OperationValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .expect("`OperationValue` must be finite")
    }
}

impl fmt::Display for OperationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
