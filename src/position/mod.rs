use std::fmt;

use chrono::{DateTime, Utc};

use crate::market::OrderSide;

mod machine;

pub use machine::{PositionStateMachine, RiskLimits};

/// The three mutually exclusive position sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// The single position of a running strategy instance.
///
/// Created flat at engine start and mutated only by the
/// [`PositionStateMachine`] in response to confirmed fills. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Position {
    side: PositionSide,
    entry_price: Option<f64>,
    opened_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn side(&self) -> PositionSide {
        self.side
    }

    /// The close recorded when the position was opened; `None` while flat.
    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    fn open(&mut self, side: PositionSide, entry_price: f64, opened_at: DateTime<Utc>) {
        self.side = side;
        self.entry_price = Some(entry_price);
        self.opened_at = Some(opened_at);
    }

    fn close(&mut self) {
        self.side = PositionSide::Flat;
        self.entry_price = None;
        self.opened_at = None;
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry_price {
            Some(entry) => write!(f, "{} @ {entry:.2}", self.side),
            None => write!(f, "{}", self.side),
        }
    }
}

/// Validated order intent, derived from a risk trigger or a signal action.
///
/// Each intent carries its wire side and its entry/exit classification, so
/// quantity derivation and the trade-cap guard stay attached to the intent
/// rather than being re-derived from string tags at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderIntent {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl OrderIntent {
    /// The market-order side submitted for this intent.
    pub fn order_side(&self) -> OrderSide {
        match self {
            Self::OpenLong | Self::CloseShort => OrderSide::Buy,
            Self::OpenShort | Self::CloseLong => OrderSide::Sell,
        }
    }

    /// Returns `true` for intents that open a position.
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::OpenLong | Self::OpenShort)
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenLong => write!(f, "open long"),
            Self::OpenShort => write!(f, "open short"),
            Self::CloseLong => write!(f, "close long"),
            Self::CloseShort => write!(f, "close short"),
        }
    }
}

/// Risk threshold that forced an exit regardless of signal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTrigger {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for RiskTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StopLoss => write!(f, "stop-loss"),
            Self::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// Read-only view of the position machine broadcast to update subscribers.
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub side: PositionSide,
    pub entry_price: Option<f64>,
    pub opened_at: Option<DateTime<Utc>>,
    pub trade_count: u32,
}

impl fmt::Display for PositionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position {}", self.side)?;
        if let Some(entry) = self.entry_price {
            write!(f, " @ {entry:.2}")?;
        }
        write!(f, " (trades: {})", self.trade_count)
    }
}
