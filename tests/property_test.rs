//! Property tests over generated price paths and action sequences.

mod common;

use proptest::prelude::*;

use alphasim::domain::costs::{CostModel, CostRates, CostTiming};
use alphasim::domain::metrics::{drawdown, equity_curve, max_drawdown};
use alphasim::domain::observation::ObservationBuilder;
use alphasim::domain::position::Position;
use alphasim::domain::reward::RewardParams;
use alphasim::domain::simulation::{SimulationConfig, Simulator, TradeAction};
use alphasim::ports::policy_port::PolicyPort;

use common::make_series;

/// Replays a generated action sequence.
struct SequencePolicy {
    actions: Vec<i64>,
    cursor: usize,
}

impl PolicyPort for SequencePolicy {
    fn predict(&mut self, _observation: &[f64]) -> Result<i64, String> {
        let action = self.actions.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;
        Ok(action)
    }
}

fn path_and_actions() -> impl Strategy<Value = (Vec<f64>, Vec<i64>)> {
    (4usize..30).prop_flat_map(|len| {
        (
            prop::collection::vec(1.0f64..500.0, len),
            prop::collection::vec(0i64..3, len),
        )
    })
}

fn run_simulation(
    prices: &[f64],
    actions: Vec<i64>,
    costs: CostModel,
    min_holding_days: u32,
) -> alphasim::domain::simulation::RunResult {
    let series = make_series(prices);
    let config = SimulationConfig {
        min_holding_days,
        ..SimulationConfig::default()
    };
    let mut simulator =
        Simulator::new(&series, costs, RewardParams::default(), config).unwrap();
    let mut policy = SequencePolicy { actions, cursor: 0 };
    simulator.run(&mut policy, &ObservationBuilder::new(1, true))
}

proptest! {
    /// With all cost rates at zero, net return equals raw return on every
    /// step, for any price path and action sequence.
    #[test]
    fn cost_neutrality((prices, actions) in path_and_actions()) {
        let result = run_simulation(&prices, actions, CostModel::default(), 1);
        prop_assert!(result.is_complete());
        for record in &result.records {
            prop_assert!((record.net_return - record.raw_return).abs() < f64::EPSILON);
        }
    }

    /// Net equity compounds step by step, and drawdowns stay non-positive
    /// with the maximum drawdown equal to the series minimum.
    #[test]
    fn equity_and_drawdown_invariants((prices, actions) in path_and_actions()) {
        let costs = CostModel::new(
            CostRates::new(0.0003, 0.0007),
            CostRates::new(0.0001, 0.0002),
            CostTiming::OnTrade,
        );
        let result = run_simulation(&prices, actions, costs, 1);
        prop_assert!(result.is_complete());

        let curve = equity_curve(&result.records);
        let mut previous = 1.0;
        for (point, record) in curve.iter().zip(&result.records) {
            let expected = previous * (1.0 + record.net_return);
            prop_assert!((point.net - expected).abs() < 1e-9);
            previous = point.net;
        }

        let net: Vec<f64> = curve.iter().map(|p| p.net).collect();
        let dd = drawdown(&net);
        for &d in &dd {
            prop_assert!(d <= 1e-12);
        }
        let min_dd = dd.iter().copied().fold(f64::MAX, f64::min);
        prop_assert!((max_drawdown(&dd) - min_dd.min(0.0)).abs() < 1e-12);
    }

    /// Without shaping, the reward stream is exactly the net return stream.
    #[test]
    fn reward_reduces_to_net_return((prices, actions) in path_and_actions()) {
        let result = run_simulation(&prices, actions, CostModel::default(), 1);
        prop_assert!(result.is_complete());
        for (reward, record) in result.rewards.iter().zip(&result.records) {
            prop_assert!((reward - record.net_return).abs() < f64::EPSILON);
        }
    }

    /// Under a minimum holding period, consecutive position changes are
    /// always at least that many bars apart, whatever the policy requests.
    #[test]
    fn min_hold_spacing((prices, actions) in path_and_actions()) {
        let min_hold = 3u32;
        let result = run_simulation(&prices, actions, CostModel::default(), min_hold);
        prop_assert!(result.is_complete());

        let flips: Vec<usize> = result
            .records
            .iter()
            .filter(|r| r.action != TradeAction::Hold)
            .map(|r| r.step)
            .collect();
        for pair in flips.windows(2) {
            prop_assert!(pair[1] - pair[0] >= min_hold as usize);
        }
    }

    /// The ledger's position column always matches what the actions imply:
    /// a record never shows a flat position after an entry action.
    #[test]
    fn ledger_positions_consistent((prices, actions) in path_and_actions()) {
        let result = run_simulation(&prices, actions, CostModel::default(), 1);
        prop_assert!(result.is_complete());
        for record in &result.records {
            match record.action {
                TradeAction::EnterLong => prop_assert!(record.position == Position::Long),
                TradeAction::EnterShort => prop_assert!(record.position == Position::Short),
                TradeAction::Exit => prop_assert!(record.position == Position::Flat),
                TradeAction::Hold => {}
            }
        }
    }
}
