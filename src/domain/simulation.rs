//! Policy-replay simulation driver.
//!
//! Drives the position state machine bar-by-bar over a historical window,
//! feeding each observation to an external policy and accumulating the trade
//! ledger. Bars are processed strictly in order; all data must be in memory
//! before the loop starts. A failed run keeps the completed ledger prefix so
//! partial metrics can still be reported.

use chrono::NaiveDate;
use rand::Rng;

use crate::domain::bar::PriceSeries;
use crate::domain::costs::{CostModel, CostRegime};
use crate::domain::error::AlphasimError;
use crate::domain::observation::ObservationBuilder;
use crate::domain::position::{Action, Position, PositionState};
use crate::domain::reward::{
    compose_reward, compute_return, ForecastSignal, RewardInputs, RewardParams, EPSILON,
};
use crate::ports::policy_port::PolicyPort;

/// Ledger-facing action: what actually happened at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Hold,
    EnterLong,
    EnterShort,
    /// Liquidation to cash (rule replay and end-of-series closure).
    Exit,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Hold => "HOLD",
            TradeAction::EnterLong => "LONG",
            TradeAction::EnterShort => "SHORT",
            TradeAction::Exit => "EXIT",
        }
    }
}

/// One ledger row. `step`, `date`, and `price` refer to the decision bar;
/// the returns are realized over the following bar and `unrealized_pnl` is
/// the state after that bar.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub step: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub action: TradeAction,
    pub position: Position,
    pub raw_return: f64,
    pub net_return: f64,
    pub txn_cost: f64,
    pub slippage: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug)]
pub struct StepOutcome {
    pub record: TradeRecord,
    pub reward: f64,
    pub done: bool,
}

/// Outcome of a full replay. When `failure` is set the records are the
/// completed prefix up to the failing step.
#[derive(Debug)]
pub struct RunResult {
    pub records: Vec<TradeRecord>,
    pub rewards: Vec<f64>,
    pub failure: Option<AlphasimError>,
}

impl RunResult {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn net_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.net_return).collect()
    }

    pub fn raw_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.raw_return).collect()
    }

    pub fn total_costs(&self) -> f64 {
        self.records.iter().map(|r| r.txn_cost + r.slippage).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// First decision bar.
    pub start_index: usize,
    /// Last bar index consumed (inclusive); `None` means the end of the series.
    pub end_index: Option<usize>,
    pub min_holding_days: u32,
    pub regime: CostRegime,
    pub epsilon: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start_index: 0,
            end_index: None,
            min_holding_days: 1,
            regime: CostRegime::Evaluation,
            epsilon: EPSILON,
        }
    }
}

pub struct Simulator<'a> {
    series: &'a PriceSeries,
    costs: CostModel,
    reward_params: RewardParams,
    config: SimulationConfig,
    state: PositionState,
    current_step: usize,
    end_index: usize,
    return_history: Vec<f64>,
}

impl<'a> Simulator<'a> {
    pub fn new(
        series: &'a PriceSeries,
        costs: CostModel,
        reward_params: RewardParams,
        config: SimulationConfig,
    ) -> Result<Self, AlphasimError> {
        let end_index = config.end_index.unwrap_or(series.len().saturating_sub(1));
        let need = (config.min_holding_days as usize + 1).max(config.start_index + 2);
        if series.len() < need || end_index >= series.len() || config.start_index >= end_index {
            return Err(AlphasimError::InsufficientData {
                have: series.len(),
                need,
            });
        }

        let state = PositionState::new(config.min_holding_days);
        let current_step = config.start_index;
        Ok(Simulator {
            series,
            costs,
            reward_params,
            config,
            state,
            current_step,
            end_index,
            return_history: Vec::new(),
        })
    }

    /// Reset to the configured start for a fresh episode or backtest run.
    pub fn reset(&mut self) {
        self.current_step = self.config.start_index;
        self.state.reset();
        self.return_history.clear();
    }

    /// Reset to a random start bar. Training-only stochastic episode
    /// initialization; evaluation always resets deterministically.
    pub fn reset_random<R: Rng>(&mut self, rng: &mut R) {
        self.reset();
        let lo = self.config.start_index;
        let hi = (self.end_index.saturating_sub(10)).max(lo + 1);
        self.current_step = rng.gen_range(lo..hi);
    }

    /// Switch cost regimes mid-lifecycle (curriculum training). Does not
    /// touch position or ledger state.
    pub fn set_regime(&mut self, regime: CostRegime) {
        self.config.regime = regime;
    }

    pub fn regime(&self) -> CostRegime {
        self.config.regime
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn return_history(&self) -> &[f64] {
        &self.return_history
    }

    /// The last consumed bar has no successor, so the simulation is done once
    /// the cursor reaches the end index.
    pub fn is_done(&self) -> bool {
        self.current_step >= self.end_index
    }

    /// Advance one bar under `action`.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, AlphasimError> {
        if self.is_done() {
            return Err(AlphasimError::Data {
                reason: "simulation already at end of data".into(),
            });
        }

        let step = self.current_step;
        let prev_price = self.series.checked_close(step)?;
        let executed = self.state.apply_action(step, action, prev_price)?;

        let next_step = step + 1;
        let next_price = self.series.checked_close(next_step)?;

        let step_return = compute_return(
            self.state.position,
            prev_price,
            next_price,
            executed,
            self.config.regime,
            &self.costs,
            self.config.epsilon,
        );
        self.return_history.push(step_return.net);
        self.state.advance(next_step, next_price)?;

        let forecast = self
            .series
            .forecast_return(next_step)
            .map(ForecastSignal::from_return)
            .unwrap_or_else(ForecastSignal::neutral);
        let inputs = RewardInputs {
            step_return,
            position: self.state.position,
            holding_days: self.state.holding_days,
            return_history: &self.return_history,
            momentum: self.series.momentum(next_step),
            volatility: self.series.volatility(next_step),
            forecast,
        };
        let reward = compose_reward(&self.reward_params, &inputs);

        let trade_action = match (executed, self.state.position) {
            (true, Position::Long) => TradeAction::EnterLong,
            (true, Position::Short) => TradeAction::EnterShort,
            _ => TradeAction::Hold,
        };
        let record = TradeRecord {
            step,
            date: self.series.bar(step).date,
            price: prev_price,
            action: trade_action,
            position: self.state.position,
            raw_return: step_return.raw,
            net_return: step_return.net,
            txn_cost: step_return.txn_cost,
            slippage: step_return.slippage,
            unrealized_pnl: self.state.unrealized_pnl,
        };

        self.current_step = next_step;
        Ok(StepOutcome {
            record,
            reward,
            done: self.is_done(),
        })
    }

    /// Policy-replay loop: query the policy each bar until the window is
    /// exhausted or the run fails. Policy errors and out-of-range actions are
    /// fatal; the ledger prefix completed so far is always returned.
    pub fn run(
        &mut self,
        policy: &mut dyn PolicyPort,
        observations: &ObservationBuilder,
    ) -> RunResult {
        let mut records = Vec::new();
        let mut rewards = Vec::new();

        if self.current_step < observations.min_step() {
            self.current_step = observations.min_step();
        }
        if self.current_step >= self.end_index {
            return RunResult {
                records,
                rewards,
                failure: Some(AlphasimError::InsufficientData {
                    have: self.series.len(),
                    need: observations.min_step() + 2,
                }),
            };
        }

        while !self.is_done() {
            let step = self.current_step;
            let obs = observations.build(self.series, step, &self.state);

            let action = match policy.predict(&obs) {
                Ok(index) => match Action::from_index(index) {
                    Some(action) => action,
                    None => {
                        return RunResult {
                            records,
                            rewards,
                            failure: Some(AlphasimError::Policy {
                                step,
                                reason: format!("action {index} outside 0..=2"),
                            }),
                        };
                    }
                },
                Err(reason) => {
                    return RunResult {
                        records,
                        rewards,
                        failure: Some(AlphasimError::Policy { step, reason }),
                    };
                }
            };

            match self.step(action) {
                Ok(outcome) => {
                    records.push(outcome.record);
                    rewards.push(outcome.reward);
                }
                Err(err) => {
                    return RunResult {
                        records,
                        rewards,
                        failure: Some(err),
                    };
                }
            }
        }

        RunResult {
            records,
            rewards,
            failure: None,
        }
    }
}
