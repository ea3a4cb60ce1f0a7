use std::sync::Arc;

use chrono::Utc;
use tokio::{
    sync::{Mutex, broadcast},
    time,
};

use crate::{
    market::{WrappedMarketDataSource, WrappedOrderExecutor},
    util::{AbortOnDropHandle, DateTimeExt, Never},
};

use super::{
    config::TradeProcessConfig,
    session::StrategySession,
    state::{
        TradingStatus, TradingStatusManager, TradingStatusNotRunning, TradingTransmitter,
        TradingUpdate,
    },
};

pub(crate) mod error;

use error::{ProcessResult, TradeProcessError, TradeProcessFatalError, TradeProcessRecoverableError};

pub(super) struct TradeProcess {
    config: TradeProcessConfig,
    market_data: WrappedMarketDataSource,
    order_executor: WrappedOrderExecutor,
    /// Session state survives recoverable restarts; the lock is only ever
    /// taken by the one running cycle.
    session: Mutex<StrategySession>,
    shutdown_tx: broadcast::Sender<()>,
    status_manager: Arc<TradingStatusManager>,
    update_tx: TradingTransmitter,
}

impl TradeProcess {
    pub fn spawn(
        config: TradeProcessConfig,
        market_data: WrappedMarketDataSource,
        order_executor: WrappedOrderExecutor,
        session: StrategySession,
        shutdown_tx: broadcast::Sender<()>,
        status_manager: Arc<TradingStatusManager>,
    ) -> AbortOnDropHandle<()> {
        tokio::spawn(async move {
            let update_tx = status_manager.transmitter().clone();

            let process = Self {
                config,
                market_data,
                order_executor,
                session: Mutex::new(session),
                shutdown_tx,
                status_manager,
                update_tx,
            };

            process.recovery_loop().await
        })
        .into()
    }

    /// One fetch, one enrichment, one risk/signal evaluation, at most one
    /// order per iteration; the sleep at the top of the loop is the only
    /// suspension point between cycles.
    async fn run(&self) -> ProcessResult<Never> {
        let mut next_eval = Utc::now().ceil_sec();

        loop {
            let now = Utc::now();
            if now < next_eval {
                let wait_duration = (next_eval - now).to_std().expect("valid duration");
                time::sleep(wait_duration).await;
            }
            next_eval = (Utc::now() + self.config.poll_interval().as_duration()).ceil_sec();

            let candles = self
                .market_data
                .get_candles(
                    self.config.symbol(),
                    self.config.interval(),
                    self.config.lookback(),
                )
                .await
                .map_err(TradeProcessRecoverableError::MarketData)?;

            let outcome = {
                let mut session = self.session.lock().await;
                session
                    .evaluate_cycle(&candles, &self.order_executor, self.config.order_timeout())
                    .await?
            };

            self.status_manager
                .update_if_not_running(TradingStatus::Running);

            // Ignore no-receivers errors
            if let Some(signal) = outcome.signal {
                let _ = self.update_tx.send(TradingUpdate::Signal(signal));
            }
            if let Some(order) = outcome.order {
                let _ = self.update_tx.send(TradingUpdate::Order(order));
            }
            if let Some(position) = outcome.position {
                let _ = self.update_tx.send(TradingUpdate::Position(position));
            }
        }
    }

    async fn recovery_loop(self) {
        self.status_manager
            .update(TradingStatusNotRunning::Starting.into());

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            let process_error = tokio::select! {
                Err(e) = self.run() => e,
                shutdown_res = shutdown_rx.recv() => {
                    let Err(e) = shutdown_res else {
                        // Shutdown signal received
                        return;
                    };

                    TradeProcessFatalError::ShutdownSignalRecv(e).into()
                }
            };

            match process_error {
                TradeProcessError::Fatal(err) => {
                    self.status_manager.update(err.into());
                    return;
                }
                TradeProcessError::Recoverable(err) => {
                    self.status_manager.update(err.into());
                }
            }

            // Handle shutdown signals while waiting for `restart_interval`

            tokio::select! {
                _ = time::sleep(self.config.restart_interval()) => {} // Loop restarts
                shutdown_res = shutdown_rx.recv() => {
                    if let Err(e) = shutdown_res {
                        let status = TradeProcessFatalError::ShutdownSignalRecv(e).into();
                        self.status_manager.update(status);
                    }
                    return;
                }
            }

            self.status_manager
                .update(TradingStatusNotRunning::Restarting.into());
        }
    }
}
