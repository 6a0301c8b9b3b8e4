//! Step return computation and reward composition.
//!
//! The raw return is position-adjusted over the elapsed bar; the net return
//! subtracts the cost model's charges. Reward shaping is used only by the
//! learned-policy variant: the base term is the net return (or a
//! risk-adjusted ratio), and every bonus term is strictly additive and
//! disabled by a zero coefficient, so the all-zero default reduces exactly to
//! the net return.

use crate::domain::costs::{CostModel, CostRegime};
use crate::domain::indicators::population_std;
use crate::domain::position::Position;

/// Guard for near-zero denominators in return and volatility ratios.
pub const EPSILON: f64 = 1e-6;

/// Return decomposition for one elapsed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReturn {
    pub raw: f64,
    pub net: f64,
    pub txn_cost: f64,
    pub slippage: f64,
}

/// Raw and cost-adjusted return for the step from `prev_price` to
/// `cur_price`, held in `position`.
pub fn compute_return(
    position: Position,
    prev_price: f64,
    cur_price: f64,
    trade_executed: bool,
    regime: CostRegime,
    costs: &CostModel,
    epsilon: f64,
) -> StepReturn {
    let raw = match position {
        Position::Long => (cur_price - prev_price) / (prev_price + epsilon),
        Position::Short => (prev_price - cur_price) / (prev_price + epsilon),
        Position::Flat => 0.0,
    };

    let (txn_cost, slippage) = costs.rates(trade_executed, regime);
    StepReturn {
        raw,
        net: raw - txn_cost - slippage,
        txn_cost,
        slippage,
    }
}

/// Base reward term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardMode {
    /// Reward is the net return.
    #[default]
    Net,
    /// Reward is the net return divided by the rolling volatility of the
    /// return history, floored at epsilon.
    RiskAdjusted,
}

/// External forecast reduced to direction and strength, independent of the
/// forecaster's concrete representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSignal {
    /// -1, 0, or 1.
    pub direction: i8,
    /// Non-negative signed-strength magnitude.
    pub strength: f64,
}

impl ForecastSignal {
    pub fn neutral() -> Self {
        ForecastSignal {
            direction: 0,
            strength: 0.0,
        }
    }

    /// Derive a signal from a predicted return. NaN maps to neutral.
    pub fn from_return(predicted_return: f64) -> Self {
        if predicted_return.is_nan() || predicted_return == 0.0 {
            return ForecastSignal::neutral();
        }
        ForecastSignal {
            direction: if predicted_return > 0.0 { 1 } else { -1 },
            strength: predicted_return.abs(),
        }
    }
}

/// Reward-shaping hyperparameters. The default disables all shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardParams {
    pub mode: RewardMode,
    /// Rolling window for the risk-adjusted denominator.
    pub window: usize,
    /// Bonus per unit |raw return| for holding in the right direction.
    pub holding_coef: f64,
    /// Minimum holding days before the holding bonus applies.
    pub min_trade_hold: u32,
    /// Bonus proportional to (momentum - 1) signed by position direction.
    pub momentum_coef: f64,
    /// Penalty proportional to rolling volatility while a position is held.
    pub vol_penalty: f64,
    /// Bonus proportional to forecast strength when position matches the
    /// forecast direction.
    pub align_coef: f64,
    pub epsilon: f64,
}

impl Default for RewardParams {
    fn default() -> Self {
        RewardParams {
            mode: RewardMode::Net,
            window: 30,
            holding_coef: 0.0,
            min_trade_hold: 1,
            momentum_coef: 0.0,
            vol_penalty: 0.0,
            align_coef: 0.0,
            epsilon: EPSILON,
        }
    }
}

/// Everything the composer may consume for one step. Indicator values are
/// read at the bar the step advanced to; `return_history` already includes
/// this step's net return.
#[derive(Debug, Clone, Copy)]
pub struct RewardInputs<'a> {
    pub step_return: StepReturn,
    pub position: Position,
    pub holding_days: u32,
    pub return_history: &'a [f64],
    pub momentum: Option<f64>,
    pub volatility: Option<f64>,
    pub forecast: ForecastSignal,
}

pub fn compose_reward(params: &RewardParams, inputs: &RewardInputs) -> f64 {
    let net = inputs.step_return.net;
    let raw = inputs.step_return.raw;
    let direction = inputs.position.direction();

    let mut reward = match params.mode {
        RewardMode::Net => net,
        RewardMode::RiskAdjusted => {
            let history = inputs.return_history;
            let start = history.len().saturating_sub(params.window.max(1));
            let vol = population_std(&history[start..]).max(params.epsilon);
            net / vol
        }
    };

    // Holding bonus: raw return sign agrees with the held direction.
    if params.holding_coef != 0.0
        && !inputs.position.is_flat()
        && inputs.holding_days >= params.min_trade_hold
        && raw * direction > 0.0
    {
        reward += params.holding_coef * raw.abs();
    }

    if params.momentum_coef != 0.0 {
        if let Some(momentum) = inputs.momentum {
            reward += params.momentum_coef * (momentum - 1.0) * direction;
        }
    }

    if params.vol_penalty != 0.0 && !inputs.position.is_flat() {
        if let Some(vol) = inputs.volatility {
            reward -= params.vol_penalty * vol;
        }
    }

    if params.align_coef != 0.0
        && !inputs.position.is_flat()
        && inputs.forecast.direction != 0
        && direction == f64::from(inputs.forecast.direction)
    {
        reward += params.align_coef * inputs.forecast.strength;
    }

    reward
}
