//! Policy observation construction.
//!
//! The observation handed to an external policy is the flattened feature rows
//! of the most recent `window` bars (inclusive of the current bar), optionally
//! followed by the simulation's internal state features in the fixed order
//! `[position, unrealized_pnl, holding_days]`. `window = 1` yields the basic
//! single-row observation.

use crate::domain::bar::PriceSeries;
use crate::domain::position::PositionState;

#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    pub window: usize,
    pub include_state: bool,
}

impl ObservationBuilder {
    pub fn new(window: usize, include_state: bool) -> Self {
        ObservationBuilder {
            window: window.max(1),
            include_state,
        }
    }

    /// First step index with a full window behind it.
    pub fn min_step(&self) -> usize {
        self.window - 1
    }

    /// Observation length for a series with `n_features` columns.
    pub fn len(&self, n_features: usize) -> usize {
        self.window * n_features + if self.include_state { 3 } else { 0 }
    }

    /// Build the observation at `step`. Callers must not pass a step below
    /// [`Self::min_step`].
    pub fn build(&self, series: &PriceSeries, step: usize, state: &PositionState) -> Vec<f64> {
        debug_assert!(step >= self.min_step());
        let start = step + 1 - self.window;

        let mut obs = Vec::with_capacity(self.len(series.feature_names().len()));
        for bar in &series.bars()[start..=step] {
            obs.extend_from_slice(&bar.features);
        }
        if self.include_state {
            obs.push(state.position.direction());
            obs.push(state.unrealized_pnl);
            obs.push(f64::from(state.holding_days));
        }
        obs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::position::Action;
    use chrono::NaiveDate;

    fn make_series(n: usize) -> PriceSeries {
        let bars = (0..n)
            .map(|i| {
                let mut bar = Bar::new(
                    NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                    100.0 + i as f64,
                );
                bar.features = vec![i as f64, 10.0 * i as f64];
                bar
            })
            .collect();
        PriceSeries::from_bars(bars, vec!["a".into(), "b".into()]).unwrap()
    }

    #[test]
    fn window_one_is_current_row() {
        let series = make_series(5);
        let builder = ObservationBuilder::new(1, false);
        let state = PositionState::new(1);
        let obs = builder.build(&series, 3, &state);
        // two declared features plus the three injected indicator columns
        assert_eq!(obs.len(), 5);
        assert!((obs[0] - 3.0).abs() < f64::EPSILON);
        assert!((obs[1] - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn window_flattens_rows_in_order() {
        let series = make_series(5);
        let builder = ObservationBuilder::new(3, false);
        let state = PositionState::new(1);
        let obs = builder.build(&series, 4, &state);
        let row_len = series.feature_names().len();
        assert_eq!(obs.len(), 3 * row_len);
        // oldest row first
        assert!((obs[0] - 2.0).abs() < f64::EPSILON);
        assert!((obs[row_len] - 3.0).abs() < f64::EPSILON);
        assert!((obs[2 * row_len] - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_features_are_appended() {
        let series = make_series(4);
        let builder = ObservationBuilder::new(1, true);
        let mut state = PositionState::new(1);
        state.apply_action(0, Action::Long, 100.0).unwrap();
        state.advance(0, 103.0).unwrap();

        let obs = builder.build(&series, 1, &state);
        let n = obs.len();
        assert!((obs[n - 3] - 1.0).abs() < f64::EPSILON); // long direction
        assert!((obs[n - 2] - 3.0).abs() < f64::EPSILON); // unrealized
        assert!((obs[n - 1] - 1.0).abs() < f64::EPSILON); // holding days
    }

    #[test]
    fn min_step_matches_window() {
        assert_eq!(ObservationBuilder::new(1, false).min_step(), 0);
        assert_eq!(ObservationBuilder::new(30, false).min_step(), 29);
    }

    #[test]
    fn len_accounts_for_state_features() {
        let builder = ObservationBuilder::new(4, true);
        assert_eq!(builder.len(5), 23);
    }
}
