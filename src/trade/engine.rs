use std::sync::{Arc, Mutex};

use tokio::{
    sync::broadcast::{self, error::RecvError},
    time,
};

use crate::{
    indicator::IndicatorEngine,
    market::{MarketDataSource, OrderExecutor, WrappedMarketDataSource, WrappedOrderExecutor},
    util::AbortOnDropHandle,
};

use super::{
    config::{TradingConfig, TradingControllerConfig},
    error::{Result, TradeError},
    process::{TradeProcess, error::TradeProcessFatalError},
    session::StrategySession,
    state::{
        TradingReader, TradingReceiver, TradingStatus, TradingStatusManager, TradingUpdate,
    },
};

/// Controller for managing and monitoring a running trading process.
///
/// Provides an interface to monitor status, receive updates, and perform a
/// graceful shutdown. It holds the handle to the spawned trading task and
/// coordinates shutdown signals.
pub struct TradingController {
    config: TradingControllerConfig,
    handle: Mutex<Option<AbortOnDropHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    status_manager: Arc<TradingStatusManager>,
}

impl TradingController {
    fn new(
        config: &TradingConfig,
        handle: AbortOnDropHandle<()>,
        shutdown_tx: broadcast::Sender<()>,
        status_manager: Arc<TradingStatusManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: config.into(),
            handle: Mutex::new(Some(handle)),
            shutdown_tx,
            status_manager,
        })
    }

    /// Returns a [`TradingReader`] interface for accessing trading status
    /// and updates.
    pub fn reader(&self) -> Arc<dyn TradingReader> {
        self.status_manager.clone()
    }

    /// Creates a new [`TradingReceiver`] for subscribing to status updates,
    /// signals, executed trades, and position changes.
    pub fn update_receiver(&self) -> TradingReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current [`TradingStatus`] as a snapshot.
    pub fn status_snapshot(&self) -> TradingStatus {
        self.status_manager.status_snapshot()
    }

    fn try_consume_handle(&self) -> Option<AbortOnDropHandle<()>> {
        self.handle
            .lock()
            .expect("`TradingController` mutex can't be poisoned")
            .take()
    }

    /// Tries to perform a clean shutdown of the trading process and consumes
    /// the task handle.
    ///
    /// If a clean shutdown fails, the process is aborted. This method can
    /// only be called once per controller instance.
    ///
    /// Returns an error if the process had to be aborted, or if the handle
    /// was already consumed.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(mut handle) = self.try_consume_handle() else {
            return Err(TradeError::AlreadyShutdown);
        };

        if handle.is_finished() {
            let status = self.status_manager.status_snapshot();
            return Err(TradeError::AlreadyTerminated(status));
        }

        self.status_manager.update(TradingStatus::ShutdownInitiated);

        let shutdown_send_res = self.shutdown_tx.send(()).map_err(|e| {
            handle.abort();
            TradeProcessFatalError::SendShutdownSignalFailed(e)
        });

        let shutdown_res = match shutdown_send_res {
            Ok(_) => {
                tokio::select! {
                    join_res = &mut handle => {
                        join_res.map_err(TradeProcessFatalError::ProcessTaskJoin)
                    }
                    _ = time::sleep(self.config.shutdown_timeout()) => {
                        handle.abort();
                        Err(TradeProcessFatalError::ShutdownTimeout)
                    }
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = shutdown_res {
            let e_ref = Arc::new(e);
            self.status_manager.update(e_ref.clone().into());

            return Err(TradeError::ShutdownFailed(e_ref));
        }

        self.status_manager.update(TradingStatus::Shutdown);
        Ok(())
    }

    /// Waits until the trading process has stopped and returns the final
    /// status.
    ///
    /// Blocks until the process reaches a stopped state, either through
    /// graceful shutdown or termination.
    pub async fn until_stopped(&self) -> TradingStatus {
        let mut update_rx = self.update_receiver();

        let status = self.status_snapshot();
        if status.is_stopped() {
            return status;
        }

        loop {
            match update_rx.recv().await {
                Ok(update) => {
                    if let TradingUpdate::Status(status) = update
                        && status.is_stopped()
                    {
                        return status;
                    }
                }
                Err(RecvError::Lagged(_)) => {
                    let status = self.status_snapshot();
                    if status.is_stopped() {
                        return status;
                    }
                }
                Err(RecvError::Closed) => return self.status_snapshot(),
            }
        }
    }
}

/// Builder for configuring and starting the trading engine.
///
/// Encapsulates the configuration and the injected market-data and
/// order-execution capabilities. The trading process is spawned when
/// [`start`](Self::start) is called, and a [`TradingController`] is returned
/// for monitoring and management.
pub struct TradingEngine {
    config: TradingConfig,
    market_data: Arc<dyn MarketDataSource>,
    order_executor: Arc<dyn OrderExecutor>,
    status_manager: Arc<TradingStatusManager>,
}

impl std::fmt::Debug for TradingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TradingEngine {
    /// Creates a new trading engine with the given configuration and
    /// exchange capabilities.
    ///
    /// Configuration is validated here, never at runtime: the lookback must
    /// cover the indicator warm-up or no cycle could ever produce a signal.
    pub fn new(
        config: TradingConfig,
        market_data: Arc<dyn MarketDataSource>,
        order_executor: Arc<dyn OrderExecutor>,
    ) -> Result<Self> {
        let required = IndicatorEngine::warmup_candles();
        if config.lookback().as_usize() < required {
            return Err(TradeError::LookbackBelowWarmup {
                lookback: config.lookback(),
                required,
            });
        }

        let (update_tx, _) = broadcast::channel::<TradingUpdate>(1_000);

        let status_manager = TradingStatusManager::new(update_tx);

        Ok(Self {
            config,
            market_data,
            order_executor,
            status_manager,
        })
    }

    /// Returns a reader interface for accessing trading status and updates.
    pub fn reader(&self) -> Arc<dyn TradingReader> {
        self.status_manager.clone()
    }

    /// Creates a new receiver for subscribing to trading updates.
    pub fn update_receiver(&self) -> TradingReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current trading status as a snapshot.
    pub fn status_snapshot(&self) -> TradingStatus {
        self.status_manager.status_snapshot()
    }

    /// Starts the trading process and returns a [`TradingController`] for
    /// managing it.
    ///
    /// This consumes the engine and spawns the trading task in the
    /// background.
    pub fn start(self) -> Arc<TradingController> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let session = StrategySession::new(&self.config);

        let handle = TradeProcess::spawn(
            (&self.config).into(),
            WrappedMarketDataSource::new(self.market_data),
            WrappedOrderExecutor::new(self.order_executor),
            session,
            shutdown_tx.clone(),
            self.status_manager.clone(),
        );

        TradingController::new(&self.config, handle, shutdown_tx, self.status_manager)
    }
}
