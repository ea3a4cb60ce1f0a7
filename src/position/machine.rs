use chrono::{DateTime, Utc};

use crate::{shared::Percent, signal::SignalAction};

use super::{OrderIntent, Position, PositionSide, PositionSnapshot, RiskTrigger};

/// Risk configuration applied ahead of every signal check.
///
/// Immutable for the lifetime of a trading session and read-only to every
/// component but the state machine.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    /// Adverse move from the entry price that forces an exit.
    pub stop_loss: Percent,
    /// Favorable move from the entry price that forces an exit.
    pub take_profit: Percent,
    /// Entries allowed per session. Exits are never blocked by this cap.
    pub max_trades: u32,
}

/// The flat/long/short state machine and its risk gate.
///
/// Owns the session's [`Position`] and the monotone trade counter. State
/// only advances through [`apply_fill`](Self::apply_fill), which callers
/// invoke after a confirmed fill; failed or rejected submissions leave the
/// machine untouched and the same condition re-fires on the next cycle.
///
/// The counter has no in-process reset: the cap is per engine run, and
/// resetting it means restarting the engine.
#[derive(Debug)]
pub struct PositionStateMachine {
    limits: RiskLimits,
    position: Position,
    trade_count: u32,
}

impl PositionStateMachine {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            position: Position::default(),
            trade_count: 0,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Number of entries executed so far.
    pub fn trade_count(&self) -> u32 {
        self.trade_count
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            side: self.position.side(),
            entry_price: self.position.entry_price(),
            opened_at: self.position.opened_at(),
            trade_count: self.trade_count,
        }
    }

    /// Checks the stop-loss and take-profit thresholds against `close`.
    ///
    /// Evaluated every cycle **before** any signal-driven exit; stop-loss
    /// takes priority over take-profit. Returns `None` while flat.
    pub fn risk_exit(&self, close: f64) -> Option<(OrderIntent, RiskTrigger)> {
        let entry = self.position.entry_price()?;
        let stop_loss = self.limits.stop_loss.as_f64();
        let take_profit = self.limits.take_profit.as_f64();

        match self.position.side() {
            PositionSide::Flat => None,
            PositionSide::Long => {
                if close <= entry * (1.0 - stop_loss) {
                    Some((OrderIntent::CloseLong, RiskTrigger::StopLoss))
                } else if close >= entry * (1.0 + take_profit) {
                    Some((OrderIntent::CloseLong, RiskTrigger::TakeProfit))
                } else {
                    None
                }
            }
            PositionSide::Short => {
                if close >= entry * (1.0 + stop_loss) {
                    Some((OrderIntent::CloseShort, RiskTrigger::StopLoss))
                } else if close <= entry * (1.0 - take_profit) {
                    Some((OrderIntent::CloseShort, RiskTrigger::TakeProfit))
                } else {
                    None
                }
            }
        }
    }

    /// Converts a signal action into an order intent consistent with the
    /// current side.
    ///
    /// Entries require a flat position and an unexhausted trade cap; exits
    /// require the matching side and are never blocked by the cap.
    pub fn intent_for(&self, action: SignalAction) -> Option<OrderIntent> {
        match action {
            SignalAction::EnterLong => {
                (self.position.is_flat() && self.entries_remaining()).then_some(OrderIntent::OpenLong)
            }
            SignalAction::EnterShort => (self.position.is_flat() && self.entries_remaining())
                .then_some(OrderIntent::OpenShort),
            SignalAction::ExitLong => {
                (self.position.side() == PositionSide::Long).then_some(OrderIntent::CloseLong)
            }
            SignalAction::ExitShort => {
                (self.position.side() == PositionSide::Short).then_some(OrderIntent::CloseShort)
            }
        }
    }

    fn entries_remaining(&self) -> bool {
        self.trade_count < self.limits.max_trades
    }

    /// Advances the machine after a confirmed fill.
    ///
    /// `close` is the decision candle's close, recorded as the entry price
    /// for entries. Callers only pass intents the machine derived for the
    /// current cycle, so the transition is always consistent with the side.
    pub fn apply_fill(&mut self, intent: OrderIntent, close: f64, time: DateTime<Utc>) {
        match intent {
            OrderIntent::OpenLong => {
                self.position.open(PositionSide::Long, close, time);
                self.trade_count += 1;
            }
            OrderIntent::OpenShort => {
                self.position.open(PositionSide::Short, close, time);
                self.trade_count += 1;
            }
            OrderIntent::CloseLong | OrderIntent::CloseShort => {
                self.position.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn limits() -> RiskLimits {
        RiskLimits {
            stop_loss: Percent::try_from(0.05).unwrap(),
            take_profit: Percent::try_from(0.10).unwrap(),
            max_trades: 2,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn entry_fill_opens_position_and_counts_the_trade() {
        let mut machine = PositionStateMachine::new(limits());
        assert!(machine.position().is_flat());

        let intent = machine.intent_for(SignalAction::EnterLong).unwrap();
        assert_eq!(intent, OrderIntent::OpenLong);
        assert_eq!(intent.order_side(), crate::market::OrderSide::Buy);

        machine.apply_fill(intent, 105.0, t0());
        assert_eq!(machine.position().side(), PositionSide::Long);
        assert_eq!(machine.position().entry_price(), Some(105.0));
        assert_eq!(machine.position().opened_at(), Some(t0()));
        assert_eq!(machine.trade_count(), 1);
    }

    #[test]
    fn exit_fill_clears_the_position_but_not_the_counter() {
        let mut machine = PositionStateMachine::new(limits());
        machine.apply_fill(OrderIntent::OpenShort, 100.0, t0());
        assert_eq!(machine.trade_count(), 1);

        let intent = machine.intent_for(SignalAction::ExitShort).unwrap();
        assert_eq!(intent, OrderIntent::CloseShort);
        assert_eq!(intent.order_side(), crate::market::OrderSide::Buy);

        machine.apply_fill(intent, 99.0, t0());
        assert!(machine.position().is_flat());
        assert_eq!(machine.position().entry_price(), None);
        assert_eq!(machine.trade_count(), 1);
    }

    mod risk_exit {
        use super::*;

        #[test]
        fn flat_position_has_no_risk_exit() {
            let machine = PositionStateMachine::new(limits());
            assert_eq!(machine.risk_exit(50.0), None);
        }

        #[test]
        fn long_stop_loss_fires_at_and_below_threshold() {
            let mut machine = PositionStateMachine::new(limits());
            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());

            assert_eq!(machine.risk_exit(95.1), None);
            assert_eq!(
                machine.risk_exit(95.0),
                Some((OrderIntent::CloseLong, RiskTrigger::StopLoss))
            );
            assert_eq!(
                machine.risk_exit(94.0),
                Some((OrderIntent::CloseLong, RiskTrigger::StopLoss))
            );
        }

        #[test]
        fn long_take_profit_fires_at_and_above_threshold() {
            let mut machine = PositionStateMachine::new(limits());
            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());

            assert_eq!(machine.risk_exit(109.9), None);
            assert_eq!(
                machine.risk_exit(110.0),
                Some((OrderIntent::CloseLong, RiskTrigger::TakeProfit))
            );
        }

        #[test]
        fn short_thresholds_mirror_the_long_ones() {
            let mut machine = PositionStateMachine::new(limits());
            machine.apply_fill(OrderIntent::OpenShort, 100.0, t0());

            assert_eq!(machine.risk_exit(100.0), None);
            assert_eq!(
                machine.risk_exit(105.0),
                Some((OrderIntent::CloseShort, RiskTrigger::StopLoss))
            );
            assert_eq!(
                machine.risk_exit(90.0),
                Some((OrderIntent::CloseShort, RiskTrigger::TakeProfit))
            );
        }
    }

    mod trade_cap {
        use super::*;

        #[test]
        fn entries_blocked_once_cap_is_reached() {
            let mut machine = PositionStateMachine::new(limits());

            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());
            machine.apply_fill(OrderIntent::CloseLong, 101.0, t0());
            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());
            assert_eq!(machine.trade_count(), 2);

            // Cap reached: the exit still resolves, a new entry does not.
            let exit = machine.intent_for(SignalAction::ExitLong);
            assert_eq!(exit, Some(OrderIntent::CloseLong));

            machine.apply_fill(OrderIntent::CloseLong, 102.0, t0());
            assert_eq!(machine.intent_for(SignalAction::EnterLong), None);
            assert_eq!(machine.intent_for(SignalAction::EnterShort), None);
        }
    }

    mod side_gating {
        use super::*;

        #[test]
        fn exits_require_the_matching_side() {
            let mut machine = PositionStateMachine::new(limits());
            assert_eq!(machine.intent_for(SignalAction::ExitLong), None);
            assert_eq!(machine.intent_for(SignalAction::ExitShort), None);

            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());
            assert_eq!(machine.intent_for(SignalAction::ExitShort), None);
            assert_eq!(
                machine.intent_for(SignalAction::ExitLong),
                Some(OrderIntent::CloseLong)
            );
        }

        #[test]
        fn entries_require_a_flat_position() {
            let mut machine = PositionStateMachine::new(limits());
            machine.apply_fill(OrderIntent::OpenLong, 100.0, t0());

            assert_eq!(machine.intent_for(SignalAction::EnterLong), None);
            assert_eq!(machine.intent_for(SignalAction::EnterShort), None);
        }
    }
}
