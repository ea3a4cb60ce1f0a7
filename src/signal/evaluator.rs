use crate::{
    indicator::IndicatorRow,
    position::{Position, PositionSide},
    shared::Percent,
};

use super::SignalAction;

/// Pure predicate set deriving at most one [`SignalAction`] per cycle.
///
/// Every predicate requires the row to be fully warmed up; with any
/// indicator still undefined no signal fires. Side gating makes the
/// predicates mutually exclusive: entries are only considered while flat,
/// exits only from the matching side. Risk exits (stop-loss, take-profit)
/// are handled upstream and take priority over everything here.
#[derive(Debug, Clone, Copy)]
pub struct SignalEvaluator {
    pullback: Percent,
    min_profit: Percent,
    rsi_oversold: f64,
    rsi_overbought: f64,
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self {
            pullback: Percent::try_from(0.003).expect("must be a valid `Percent`"),
            min_profit: Percent::try_from(0.0005).expect("must be a valid `Percent`"),
            rsi_oversold: 35.0,
            rsi_overbought: 70.0,
        }
    }
}

impl SignalEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the minimum move away from the tracked extremum that counts
    /// as a confirmed pullback.
    pub fn pullback(&self) -> Percent {
        self.pullback
    }

    /// Returns the minimum favorable move from the entry price required by
    /// the signal exits.
    pub fn min_profit(&self) -> Percent {
        self.min_profit
    }

    /// Returns the RSI level below which the market counts as oversold.
    pub fn rsi_oversold(&self) -> f64 {
        self.rsi_oversold
    }

    /// Returns the RSI level above which the market counts as overbought.
    pub fn rsi_overbought(&self) -> f64 {
        self.rsi_overbought
    }

    /// Sets the pullback confirmation threshold.
    ///
    /// Default: `0.3%`
    pub fn with_pullback(mut self, pullback: Percent) -> Self {
        self.pullback = pullback;
        self
    }

    /// Sets the minimum profit required by signal exits.
    ///
    /// Default: `0.05%`
    pub fn with_min_profit(mut self, min_profit: Percent) -> Self {
        self.min_profit = min_profit;
        self
    }

    /// Sets the oversold RSI level.
    ///
    /// Default: `35`
    pub fn with_rsi_oversold(mut self, level: f64) -> Self {
        self.rsi_oversold = level;
        self
    }

    /// Sets the overbought RSI level.
    ///
    /// Default: `70`
    pub fn with_rsi_overbought(mut self, level: f64) -> Self {
        self.rsi_overbought = level;
        self
    }

    /// Evaluates the latest indicator row against the current position.
    ///
    /// `extrema` is the `(lowest, highest)` close pair tracked since the
    /// hunting phase began; it gates the entry predicates and is ignored for
    /// exits.
    pub fn evaluate(
        &self,
        row: &IndicatorRow,
        position: &Position,
        extrema: Option<(f64, f64)>,
    ) -> Option<SignalAction> {
        let rsi = row.rsi14?;
        row.sma9?;
        row.sma21?;

        let close = row.close;
        let ema100 = row.ema100;

        match position.side() {
            PositionSide::Flat => {
                let (lowest, highest) = extrema?;

                if close > ema100
                    && (close - lowest) / lowest >= self.pullback.as_f64()
                    && rsi < self.rsi_oversold
                {
                    return Some(SignalAction::EnterLong);
                }

                if close < ema100
                    && (highest - close) / highest >= self.pullback.as_f64()
                    && rsi > self.rsi_overbought
                {
                    return Some(SignalAction::EnterShort);
                }

                None
            }
            PositionSide::Long => {
                let entry = position.entry_price()?;

                (close > ema100
                    && (close - entry) / entry >= self.min_profit.as_f64()
                    && rsi > self.rsi_overbought)
                    .then_some(SignalAction::ExitLong)
            }
            PositionSide::Short => {
                let entry = position.entry_price()?;

                (close < ema100
                    && (entry - close) / entry >= self.min_profit.as_f64()
                    && rsi < self.rsi_oversold)
                    .then_some(SignalAction::ExitShort)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::{
        position::{OrderIntent, PositionStateMachine, RiskLimits},
        shared::Percent,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn row(close: f64, ema100: f64, rsi: f64) -> IndicatorRow {
        IndicatorRow {
            open_time: t0(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
            rsi14: Some(rsi),
            ema100,
            ema200: ema100,
            sma9: Some(close),
            sma21: Some(close),
        }
    }

    fn machine() -> PositionStateMachine {
        PositionStateMachine::new(RiskLimits {
            stop_loss: Percent::try_from(0.05).unwrap(),
            take_profit: Percent::try_from(0.10).unwrap(),
            max_trades: 10,
        })
    }

    fn long_position(entry: f64) -> PositionStateMachine {
        let mut machine = machine();
        machine.apply_fill(OrderIntent::OpenLong, entry, t0());
        machine
    }

    fn short_position(entry: f64) -> PositionStateMachine {
        let mut machine = machine();
        machine.apply_fill(OrderIntent::OpenShort, entry, t0());
        machine
    }

    #[test]
    fn enter_long_on_oversold_pullback_above_trend() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        // close 105 > ema 100, (105 - 100) / 100 = 5% >= 0.3%, rsi 30 < 35
        let action = evaluator.evaluate(&row(105.0, 100.0, 30.0), machine.position(), Some((100.0, 106.0)));
        assert_eq!(action, Some(SignalAction::EnterLong));
    }

    #[test]
    fn no_entry_without_confirmed_pullback() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        // Distance from the lowest close is only 0.1%.
        let action = evaluator.evaluate(
            &row(105.0, 100.0, 30.0),
            machine.position(),
            Some((104.895, 106.0)),
        );
        assert_eq!(action, None);
    }

    #[test]
    fn no_entry_below_trend_filter() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        let action = evaluator.evaluate(&row(95.0, 100.0, 30.0), machine.position(), Some((90.0, 96.0)));
        assert_eq!(action, None);
    }

    #[test]
    fn enter_short_on_overbought_drop_below_trend() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        // close 95 < ema 100, (100 - 95) / 100 = 5% >= 0.3%, rsi 75 > 70
        let action = evaluator.evaluate(&row(95.0, 100.0, 75.0), machine.position(), Some((94.0, 100.0)));
        assert_eq!(action, Some(SignalAction::EnterShort));
    }

    #[test]
    fn undefined_indicators_silence_every_predicate() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        let mut cold = row(105.0, 100.0, 30.0);
        cold.rsi14 = None;
        assert_eq!(
            evaluator.evaluate(&cold, machine.position(), Some((100.0, 106.0))),
            None
        );

        let mut cold = row(105.0, 100.0, 30.0);
        cold.sma21 = None;
        assert_eq!(
            evaluator.evaluate(&cold, machine.position(), Some((100.0, 106.0))),
            None
        );
    }

    #[test]
    fn missing_extrema_blocks_entries() {
        let evaluator = SignalEvaluator::new();
        let machine = machine();

        let action = evaluator.evaluate(&row(105.0, 100.0, 30.0), machine.position(), None);
        assert_eq!(action, None);
    }

    #[test]
    fn exit_long_requires_profit_and_overbought() {
        let evaluator = SignalEvaluator::new();
        let machine = long_position(100.0);

        // 0.2% above entry, rsi overbought, above trend.
        let action = evaluator.evaluate(&row(100.2, 99.0, 75.0), machine.position(), None);
        assert_eq!(action, Some(SignalAction::ExitLong));

        // Below the minimum profit: hold.
        let action = evaluator.evaluate(&row(100.01, 99.0, 75.0), machine.position(), None);
        assert_eq!(action, None);

        // Profitable but not overbought: hold.
        let action = evaluator.evaluate(&row(100.2, 99.0, 60.0), machine.position(), None);
        assert_eq!(action, None);
    }

    #[test]
    fn exit_short_requires_profit_and_oversold() {
        let evaluator = SignalEvaluator::new();
        let machine = short_position(100.0);

        let action = evaluator.evaluate(&row(99.8, 101.0, 30.0), machine.position(), None);
        assert_eq!(action, Some(SignalAction::ExitShort));

        // Above the trend filter: hold.
        let action = evaluator.evaluate(&row(99.8, 99.0, 30.0), machine.position(), None);
        assert_eq!(action, None);
    }

    #[test]
    fn entries_are_not_considered_while_positioned() {
        let evaluator = SignalEvaluator::new();
        let machine = long_position(100.0);

        // Entry-shaped row, but the evaluator only checks the long exit.
        let action = evaluator.evaluate(&row(105.0, 100.0, 30.0), machine.position(), Some((100.0, 106.0)));
        assert_eq!(action, None);
    }
}
