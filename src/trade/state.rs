use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::broadcast;

use crate::{market::TradeRecord, position::PositionSnapshot, signal::SignalEvent};

use super::process::error::{TradeProcessFatalError, TradeProcessRecoverableError};

/// Detailed status when the trading process is not actively cycling.
#[derive(Debug, Clone)]
pub enum TradingStatusNotRunning {
    /// Trading process has not been started yet.
    NotInitiated,
    /// Trading process is initializing.
    Starting,
    /// Trading process encountered a recoverable error and will restart.
    Failed(Arc<TradeProcessRecoverableError>),
    /// Trading process is restarting after an error.
    Restarting,
}

impl fmt::Display for TradingStatusNotRunning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitiated => write!(f, "Not initiated"),
            Self::Starting => write!(f, "Starting"),
            Self::Failed(error) => write!(f, "Failed: {error}"),
            Self::Restarting => write!(f, "Restarting"),
        }
    }
}

/// Overall status of the trading process.
#[derive(Debug, Clone)]
pub enum TradingStatus {
    /// Trading is not actively cycling.
    NotRunning(TradingStatusNotRunning),
    /// Trading cycles are running.
    Running,
    /// Shutdown has been requested and is in progress.
    ShutdownInitiated,
    /// Trading process has been gracefully shut down.
    Shutdown,
    /// Trading process terminated due to a fatal error.
    Terminated(Arc<TradeProcessFatalError>),
}

impl TradingStatus {
    /// Returns `true` if the trading process has stopped (either shut down
    /// or terminated).
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Shutdown | Self::Terminated(_))
    }
}

impl fmt::Display for TradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning(status) => write!(f, "Not running ({status})"),
            Self::Running => write!(f, "Running"),
            Self::ShutdownInitiated => write!(f, "Shutdown initiated"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Terminated(error) => write!(f, "Terminated: {error}"),
        }
    }
}

impl From<TradingStatusNotRunning> for TradingStatus {
    fn from(value: TradingStatusNotRunning) -> Self {
        Self::NotRunning(value)
    }
}

impl From<TradeProcessRecoverableError> for TradingStatus {
    fn from(value: TradeProcessRecoverableError) -> Self {
        TradingStatusNotRunning::Failed(Arc::new(value)).into()
    }
}

impl From<Arc<TradeProcessFatalError>> for TradingStatus {
    fn from(value: Arc<TradeProcessFatalError>) -> Self {
        Self::Terminated(value)
    }
}

impl From<TradeProcessFatalError> for TradingStatus {
    fn from(value: TradeProcessFatalError) -> Self {
        Arc::new(value).into()
    }
}

/// Update events emitted by the trading process.
///
/// Broadcast to subscribers; includes status changes, observed signals,
/// executed trades, and position changes.
#[derive(Debug, Clone)]
pub enum TradingUpdate {
    /// Trading process status has changed.
    Status(TradingStatus),
    /// A signal predicate fired on the latest candle.
    Signal(SignalEvent),
    /// An order was filled; this is the trade-log record.
    Order(TradeRecord),
    /// The position changed after a confirmed fill.
    Position(PositionSnapshot),
}

impl From<TradingStatus> for TradingUpdate {
    fn from(value: TradingStatus) -> Self {
        Self::Status(value)
    }
}

pub(crate) type TradingTransmitter = broadcast::Sender<TradingUpdate>;

/// Receiver for subscribing to [`TradingUpdate`]s.
pub type TradingReceiver = broadcast::Receiver<TradingUpdate>;

/// Trait for reading trading status and subscribing to updates.
///
/// Provides a read-only interface to the trading process state without the
/// ability to control or modify it.
pub trait TradingReader: Send + Sync + 'static {
    /// Creates a new [`TradingReceiver`] for subscribing to updates.
    fn update_receiver(&self) -> TradingReceiver;

    /// Returns the current [`TradingStatus`] as a snapshot.
    fn status_snapshot(&self) -> TradingStatus;
}

#[derive(Debug)]
pub(crate) struct TradingStatusManager {
    status: Mutex<TradingStatus>,
    update_tx: TradingTransmitter,
}

impl TradingStatusManager {
    pub fn new(update_tx: TradingTransmitter) -> Arc<Self> {
        let status = Mutex::new(TradingStatusNotRunning::NotInitiated.into());

        Arc::new(Self { status, update_tx })
    }

    fn lock_status(&self) -> MutexGuard<'_, TradingStatus> {
        self.status
            .lock()
            .expect("`TradingStatusManager` mutex can't be poisoned")
    }

    pub fn transmitter(&self) -> &TradingTransmitter {
        &self.update_tx
    }

    pub fn update(&self, new_status: TradingStatus) {
        let mut status_guard = self.lock_status();
        *status_guard = new_status.clone();
        drop(status_guard);

        // Ignore no-receivers errors
        let _ = self.update_tx.send(new_status.into());
    }

    /// Updates to `new_status` only when not already running, avoiding a
    /// `Running` broadcast on every successful cycle.
    pub fn update_if_not_running(&self, new_status: TradingStatus) {
        {
            let status_guard = self.lock_status();
            if matches!(*status_guard, TradingStatus::Running) {
                return;
            }
        }

        self.update(new_status);
    }
}

impl TradingReader for TradingStatusManager {
    fn update_receiver(&self) -> TradingReceiver {
        self.update_tx.subscribe()
    }

    fn status_snapshot(&self) -> TradingStatus {
        self.lock_status().clone()
    }
}
