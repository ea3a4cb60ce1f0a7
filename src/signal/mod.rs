use std::fmt;

use chrono::{DateTime, Utc};

mod evaluator;
mod extrema;

pub use evaluator::SignalEvaluator;
pub use extrema::ExtremaTracker;

/// Trading action derived from the latest indicator row.
///
/// A closed set of intents, each tied to the position side it is valid
/// from: entries only fire while flat, exits only from the matching side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Open a long position (oversold pullback above the trend filter).
    EnterLong,
    /// Close a long position (overbought with the minimum profit reached).
    ExitLong,
    /// Open a short position (overbought rally below the trend filter).
    EnterShort,
    /// Close a short position (oversold with the minimum profit reached).
    ExitShort,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnterLong => write!(f, "enter long"),
            Self::ExitLong => write!(f, "exit long"),
            Self::EnterShort => write!(f, "enter short"),
            Self::ExitShort => write!(f, "exit short"),
        }
    }
}

/// A signal observation broadcast to update subscribers.
#[derive(Debug, Clone)]
pub struct SignalEvent {
    pub time: DateTime<Utc>,
    pub action: SignalAction,
    pub close: f64,
    pub rsi14: f64,
    pub ema100: f64,
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal `{}` at {}: close {:.2}, rsi {:.1}, ema100 {:.2}",
            self.action, self.time, self.close, self.rsi14, self.ema100
        )
    }
}
