//! Position state machine.
//!
//! Owns the current position, entry price, holding-day counter, and
//! unrealized P&L, and legalizes one action per bar. A flip request made
//! before `min_holding_days` have elapsed is silently coerced to HOLD.

use crate::domain::error::AlphasimError;

/// Discrete policy action. Policies emit the indices 0, 1, 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hold,
    Long,
    Short,
}

impl Action {
    /// Map a policy output to an action; `None` for anything outside 0..=2.
    pub fn from_index(index: i64) -> Option<Action> {
        match index {
            0 => Some(Action::Hold),
            1 => Some(Action::Long),
            2 => Some(Action::Short),
            _ => None,
        }
    }

    pub fn index(&self) -> i64 {
        match self {
            Action::Hold => 0,
            Action::Long => 1,
            Action::Short => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

impl Position {
    /// +1 for long, -1 for short, 0 for flat.
    pub fn direction(&self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}

#[derive(Debug, Clone)]
pub struct PositionState {
    pub position: Position,
    /// Undefined (None) while flat.
    pub entry_price: Option<f64>,
    pub holding_days: u32,
    pub unrealized_pnl: f64,
    pub min_holding_days: u32,
}

impl PositionState {
    /// `min_holding_days = 1` leaves flips effectively unconstrained; the
    /// momentum variant uses 3.
    pub fn new(min_holding_days: u32) -> Self {
        PositionState {
            position: Position::Flat,
            entry_price: None,
            holding_days: 0,
            unrealized_pnl: 0.0,
            min_holding_days,
        }
    }

    pub fn reset(&mut self) {
        self.position = Position::Flat;
        self.entry_price = None;
        self.holding_days = 0;
        self.unrealized_pnl = 0.0;
    }

    fn check_price(step: usize, price: f64) -> Result<(), AlphasimError> {
        if price.is_nan() {
            return Err(AlphasimError::DataGap {
                step,
                what: "missing price".into(),
            });
        }
        if price <= 0.0 {
            return Err(AlphasimError::InvalidPrice { step, price });
        }
        Ok(())
    }

    fn hold_locked(&self) -> bool {
        !self.position.is_flat() && self.holding_days < self.min_holding_days
    }

    /// Apply one action at the current bar's price.
    ///
    /// Returns whether a flip was executed. Requests for the already-held
    /// position and HOLD are no-ops; a flip inside the minimum holding period
    /// is coerced to HOLD.
    pub fn apply_action(
        &mut self,
        step: usize,
        action: Action,
        price: f64,
    ) -> Result<bool, AlphasimError> {
        Self::check_price(step, price)?;

        let action = if self.hold_locked() { Action::Hold } else { action };

        let target = match action {
            Action::Hold => return Ok(false),
            Action::Long => Position::Long,
            Action::Short => Position::Short,
        };
        if self.position == target {
            return Ok(false);
        }

        self.position = target;
        self.entry_price = Some(price);
        self.holding_days = 0;
        Ok(true)
    }

    /// Liquidate to flat at `price`. Returns whether a position was closed.
    ///
    /// Liquidation is always legal: it is used by the long-or-cash rule and
    /// by end-of-series closure, and is not subject to the minimum holding
    /// period (which constrains flips between held directions).
    pub fn close(&mut self, step: usize, price: f64) -> Result<bool, AlphasimError> {
        Self::check_price(step, price)?;
        if self.position.is_flat() {
            return Ok(false);
        }
        self.reset();
        Ok(true)
    }

    /// Advance one bar: recompute unrealized P&L against `next_price` and
    /// bump the holding-day counter.
    pub fn advance(&mut self, step: usize, next_price: f64) -> Result<(), AlphasimError> {
        Self::check_price(step, next_price)?;

        self.unrealized_pnl = match (self.position, self.entry_price) {
            (Position::Long, Some(entry)) => next_price - entry,
            (Position::Short, Some(entry)) => entry - next_price,
            _ => 0.0,
        };

        if self.position.is_flat() {
            self.holding_days = 0;
        } else {
            self.holding_days += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_from_index_roundtrip() {
        assert_eq!(Action::from_index(0), Some(Action::Hold));
        assert_eq!(Action::from_index(1), Some(Action::Long));
        assert_eq!(Action::from_index(2), Some(Action::Short));
        assert_eq!(Action::from_index(3), None);
        assert_eq!(Action::from_index(-1), None);
        assert_eq!(Action::Short.index(), 2);
    }

    #[test]
    fn long_from_flat_executes() {
        let mut state = PositionState::new(1);
        let executed = state.apply_action(0, Action::Long, 100.0).unwrap();
        assert!(executed);
        assert_eq!(state.position, Position::Long);
        assert_eq!(state.entry_price, Some(100.0));
        assert_eq!(state.holding_days, 0);
    }

    #[test]
    fn long_while_long_is_noop() {
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 101.0).unwrap();
        let executed = state.apply_action(1, Action::Long, 101.0).unwrap();
        assert!(!executed);
        assert_eq!(state.entry_price, Some(100.0));
    }

    #[test]
    fn flip_short_from_long_resets_entry() {
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 105.0).unwrap();
        let executed = state.apply_action(1, Action::Short, 105.0).unwrap();
        assert!(executed);
        assert_eq!(state.position, Position::Short);
        assert_eq!(state.entry_price, Some(105.0));
        assert_eq!(state.holding_days, 0);
    }

    #[test]
    fn hold_never_executes() {
        let mut state = PositionState::new(1);
        assert!(!state.apply_action(0, Action::Hold, 100.0).unwrap());
        assert!(state.position.is_flat());
        assert_eq!(state.entry_price, None);
    }

    #[test]
    fn min_hold_suppresses_early_flips() {
        let mut state = PositionState::new(3);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 101.0).unwrap(); // holding_days = 1

        assert!(!state.apply_action(1, Action::Short, 101.0).unwrap());
        assert_eq!(state.position, Position::Long);
        state.advance(1, 102.0).unwrap(); // holding_days = 2

        assert!(!state.apply_action(2, Action::Short, 102.0).unwrap());
        assert_eq!(state.position, Position::Long);
        state.advance(2, 103.0).unwrap(); // holding_days = 3

        let executed = state.apply_action(3, Action::Short, 103.0).unwrap();
        assert!(executed);
        assert_eq!(state.position, Position::Short);
    }

    #[test]
    fn min_hold_does_not_block_entry_from_flat() {
        let mut state = PositionState::new(3);
        assert!(state.apply_action(0, Action::Long, 100.0).unwrap());
    }

    #[test]
    fn advance_updates_unrealized_long() {
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 104.0).unwrap();
        assert!((state.unrealized_pnl - 4.0).abs() < f64::EPSILON);
        assert_eq!(state.holding_days, 1);
    }

    #[test]
    fn advance_updates_unrealized_short() {
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Short, 100.0).unwrap();
        state.advance(0, 90.0).unwrap();
        assert!((state.unrealized_pnl - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn advance_while_flat_resets_counters() {
        let mut state = PositionState::new(1);
        state.advance(0, 100.0).unwrap();
        assert!((state.unrealized_pnl - 0.0).abs() < f64::EPSILON);
        assert_eq!(state.holding_days, 0);
    }

    #[test]
    fn close_liquidates_position() {
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 110.0).unwrap();
        let closed = state.close(1, 110.0).unwrap();
        assert!(closed);
        assert!(state.position.is_flat());
        assert_eq!(state.entry_price, None);
        assert!((state.unrealized_pnl - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_while_flat_is_noop() {
        let mut state = PositionState::new(1);
        assert!(!state.close(0, 100.0).unwrap());
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut state = PositionState::new(1);
        let err = state.apply_action(5, Action::Long, 0.0).unwrap_err();
        assert!(matches!(err, AlphasimError::InvalidPrice { step: 5, .. }));
        let err = state.advance(6, -1.0).unwrap_err();
        assert!(matches!(err, AlphasimError::InvalidPrice { step: 6, .. }));
    }

    #[test]
    fn nan_price_is_a_data_gap() {
        let mut state = PositionState::new(1);
        let err = state.apply_action(2, Action::Long, f64::NAN).unwrap_err();
        assert!(matches!(err, AlphasimError::DataGap { step: 2, .. }));
    }
}
