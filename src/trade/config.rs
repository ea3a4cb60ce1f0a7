use tokio::time;

use crate::{
    position::RiskLimits,
    shared::{CandleInterval, Lookback, OperationValue, Percent, PollInterval, Symbol},
    signal::SignalEvaluator,
};

/// Configuration for the [`TradingEngine`](crate::trade::TradingEngine)
/// controlling the traded pair, polling cadence, order sizing, risk limits,
/// and process management.
#[derive(Clone, Debug)]
pub struct TradingConfig {
    symbol: Symbol,
    interval: CandleInterval,
    lookback: Lookback,
    operation_value: OperationValue,
    stop_loss: Percent,
    take_profit: Percent,
    max_trades: u32,
    poll_interval: PollInterval,
    evaluator: SignalEvaluator,
    order_timeout: time::Duration,
    restart_interval: time::Duration,
    shutdown_timeout: time::Duration,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: Symbol::try_from("BTCUSDT").expect("must be a valid `Symbol`"),
            interval: CandleInterval::FiveMinutes,
            lookback: Lookback::try_from(250u64).expect("must be a valid `Lookback`"),
            operation_value: OperationValue::try_from(100.0)
                .expect("must be a valid `OperationValue`"),
            stop_loss: Percent::try_from(0.05).expect("must be a valid `Percent`"),
            take_profit: Percent::try_from(0.10).expect("must be a valid `Percent`"),
            max_trades: 10,
            poll_interval: PollInterval::seconds(60).expect("must be a valid `PollInterval`"),
            evaluator: SignalEvaluator::default(),
            order_timeout: time::Duration::from_secs(20),
            restart_interval: time::Duration::from_secs(10),
            shutdown_timeout: time::Duration::from_secs(6),
        }
    }
}

impl TradingConfig {
    /// Returns the traded pair.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the candle resolution fetched each cycle.
    pub fn interval(&self) -> CandleInterval {
        self.interval
    }

    /// Returns the number of candles fetched per cycle.
    pub fn lookback(&self) -> Lookback {
        self.lookback
    }

    /// Returns the quote-currency notional committed per order.
    pub fn operation_value(&self) -> OperationValue {
        self.operation_value
    }

    /// Returns the stop-loss distance from the entry price.
    pub fn stop_loss(&self) -> Percent {
        self.stop_loss
    }

    /// Returns the take-profit distance from the entry price.
    pub fn take_profit(&self) -> Percent {
        self.take_profit
    }

    /// Returns the number of entries allowed per session.
    pub fn max_trades(&self) -> u32 {
        self.max_trades
    }

    /// Returns the delay between polling cycles.
    pub fn poll_interval(&self) -> PollInterval {
        self.poll_interval
    }

    /// Returns the signal evaluator used by the session.
    pub fn evaluator(&self) -> SignalEvaluator {
        self.evaluator
    }

    /// Returns the timeout bounding each order submission.
    pub fn order_timeout(&self) -> time::Duration {
        self.order_timeout
    }

    /// Returns the interval for restarting the process after recoverable
    /// errors.
    pub fn restart_interval(&self) -> time::Duration {
        self.restart_interval
    }

    /// Returns the timeout duration for graceful shutdown operations.
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }

    /// Sets the traded pair.
    ///
    /// Default: `BTCUSDT`
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    /// Sets the candle resolution fetched each cycle.
    ///
    /// Default: `5m`
    pub fn with_interval(mut self, interval: CandleInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the number of candles fetched per cycle.
    ///
    /// Must cover the indicator warm-up; checked when the engine is built.
    ///
    /// Default: `250`
    pub fn with_lookback(mut self, lookback: Lookback) -> Self {
        self.lookback = lookback;
        self
    }

    /// Sets the quote-currency notional committed per order.
    ///
    /// Default: `100.0`
    pub fn with_operation_value(mut self, operation_value: OperationValue) -> Self {
        self.operation_value = operation_value;
        self
    }

    /// Sets the stop-loss distance from the entry price.
    ///
    /// Default: `5%`
    pub fn with_stop_loss(mut self, stop_loss: Percent) -> Self {
        self.stop_loss = stop_loss;
        self
    }

    /// Sets the take-profit distance from the entry price.
    ///
    /// Default: `10%`
    pub fn with_take_profit(mut self, take_profit: Percent) -> Self {
        self.take_profit = take_profit;
        self
    }

    /// Sets the number of entries allowed per session.
    ///
    /// Default: `10`
    pub fn with_max_trades(mut self, max_trades: u32) -> Self {
        self.max_trades = max_trades;
        self
    }

    /// Sets the delay between polling cycles.
    ///
    /// Default: `60` seconds
    pub fn with_poll_interval(mut self, poll_interval: PollInterval) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the signal evaluator used by the session.
    ///
    /// Default: [`SignalEvaluator::default`]
    pub fn with_evaluator(mut self, evaluator: SignalEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Sets the timeout bounding each order submission.
    ///
    /// Default: `20` seconds
    pub fn with_order_timeout(mut self, secs: u64) -> Self {
        self.order_timeout = time::Duration::from_secs(secs);
        self
    }

    /// Sets the interval for restarting the process after recoverable
    /// errors.
    ///
    /// Default: `10` seconds
    pub fn with_restart_interval(mut self, secs: u64) -> Self {
        self.restart_interval = time::Duration::from_secs(secs);
        self
    }

    /// Sets the timeout duration for graceful shutdown operations.
    ///
    /// Default: `6` seconds
    pub fn with_shutdown_timeout(mut self, secs: u64) -> Self {
        self.shutdown_timeout = time::Duration::from_secs(secs);
        self
    }
}

impl From<&TradingConfig> for RiskLimits {
    fn from(value: &TradingConfig) -> Self {
        Self {
            stop_loss: value.stop_loss,
            take_profit: value.take_profit,
            max_trades: value.max_trades,
        }
    }
}

#[derive(Debug)]
pub(super) struct TradingControllerConfig {
    shutdown_timeout: time::Duration,
}

impl TradingControllerConfig {
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }
}

impl From<&TradingConfig> for TradingControllerConfig {
    fn from(value: &TradingConfig) -> Self {
        Self {
            shutdown_timeout: value.shutdown_timeout,
        }
    }
}

#[derive(Debug)]
pub(super) struct TradeProcessConfig {
    symbol: Symbol,
    interval: CandleInterval,
    lookback: Lookback,
    poll_interval: PollInterval,
    order_timeout: time::Duration,
    restart_interval: time::Duration,
}

impl TradeProcessConfig {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn interval(&self) -> CandleInterval {
        self.interval
    }

    pub fn lookback(&self) -> Lookback {
        self.lookback
    }

    pub fn poll_interval(&self) -> PollInterval {
        self.poll_interval
    }

    pub fn order_timeout(&self) -> time::Duration {
        self.order_timeout
    }

    pub fn restart_interval(&self) -> time::Duration {
        self.restart_interval
    }
}

impl From<&TradingConfig> for TradeProcessConfig {
    fn from(value: &TradingConfig) -> Self {
        Self {
            symbol: value.symbol.clone(),
            interval: value.interval,
            lookback: value.lookback,
            poll_interval: value.poll_interval,
            order_timeout: value.order_timeout,
            restart_interval: value.restart_interval,
        }
    }
}
