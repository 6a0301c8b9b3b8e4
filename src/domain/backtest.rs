//! Rule-replay backtest.
//!
//! Replays a deterministic forecast-threshold rule over a historical series:
//! go long when the forecast sits above the current close, and either
//! liquidate to cash (the default long-or-cash strategy) or flip short when
//! it sits below. Produces the same ledger shape as the policy-replay driver
//! so the metrics engines are mode-agnostic.
//!
//! Backtests always run under realistic costs ([`CostRegime::Evaluation`]);
//! the curriculum regime is reserved for policy training.

use crate::domain::bar::PriceSeries;
use crate::domain::costs::{CostModel, CostRegime};
use crate::domain::error::AlphasimError;
use crate::domain::position::{Action, PositionState};
use crate::domain::reward::{compute_return, EPSILON};
use crate::domain::simulation::{RunResult, TradeAction, TradeRecord};

/// How the rule reacts to a bearish forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleMode {
    /// Liquidate to cash on a bearish forecast (the original strategy).
    #[default]
    LongCash,
    /// Flip short instead of exiting.
    LongShort,
}

#[derive(Debug, Clone)]
pub struct RuleBacktestConfig {
    pub mode: RuleMode,
    pub start_index: usize,
    /// Last bar consumed (inclusive); `None` means the end of the series.
    pub end_index: Option<usize>,
    pub min_holding_days: u32,
    pub epsilon: f64,
}

impl Default for RuleBacktestConfig {
    fn default() -> Self {
        RuleBacktestConfig {
            mode: RuleMode::LongCash,
            start_index: 0,
            end_index: None,
            min_holding_days: 1,
            epsilon: EPSILON,
        }
    }
}

enum RuleDecision {
    Hold,
    Enter(Action),
    Exit,
}

/// Replay the threshold rule over the configured window.
///
/// A bar without a forecast degrades to HOLD for that bar only. Any open
/// position is closed at the final bar's price, so the last reported record
/// realizes it. The reward stream is the net return, unshaped.
pub fn run_rule_backtest(
    series: &PriceSeries,
    costs: &CostModel,
    config: &RuleBacktestConfig,
) -> RunResult {
    let mut records: Vec<TradeRecord> = Vec::new();
    let mut rewards: Vec<f64> = Vec::new();

    let end_index = config.end_index.unwrap_or(series.len().saturating_sub(1));
    if series.len() < 2 || end_index >= series.len() || config.start_index >= end_index {
        return RunResult {
            records,
            rewards,
            failure: Some(AlphasimError::InsufficientData {
                have: series.len(),
                need: config.start_index + 2,
            }),
        };
    }

    let mut state = PositionState::new(config.min_holding_days);

    let fail = |records: Vec<TradeRecord>, rewards: Vec<f64>, err: AlphasimError| RunResult {
        records,
        rewards,
        failure: Some(err),
    };

    for step in config.start_index..end_index {
        let prev_price = match series.checked_close(step) {
            Ok(price) => price,
            Err(err) => return fail(records, rewards, err),
        };

        let decision = match series.forecast_price(step) {
            None => RuleDecision::Hold,
            Some(forecast) if forecast > prev_price => RuleDecision::Enter(Action::Long),
            Some(forecast) if forecast < prev_price => match config.mode {
                RuleMode::LongCash => RuleDecision::Exit,
                RuleMode::LongShort => RuleDecision::Enter(Action::Short),
            },
            Some(_) => RuleDecision::Hold,
        };

        let step_result = match decision {
            RuleDecision::Hold => Ok((false, TradeAction::Hold)),
            RuleDecision::Enter(action) => {
                state.apply_action(step, action, prev_price).map(|executed| {
                    let trade_action = match (executed, action) {
                        (true, Action::Long) => TradeAction::EnterLong,
                        (true, Action::Short) => TradeAction::EnterShort,
                        _ => TradeAction::Hold,
                    };
                    (executed, trade_action)
                })
            }
            RuleDecision::Exit => state.close(step, prev_price).map(|closed| {
                let trade_action = if closed { TradeAction::Exit } else { TradeAction::Hold };
                (closed, trade_action)
            }),
        };
        let (executed, trade_action) = match step_result {
            Ok(pair) => pair,
            Err(err) => return fail(records, rewards, err),
        };

        let next_price = match series.checked_close(step + 1) {
            Ok(price) => price,
            Err(err) => return fail(records, rewards, err),
        };

        let step_return = compute_return(
            state.position,
            prev_price,
            next_price,
            executed,
            CostRegime::Evaluation,
            costs,
            config.epsilon,
        );
        if let Err(err) = state.advance(step + 1, next_price) {
            return fail(records, rewards, err);
        }

        records.push(TradeRecord {
            step,
            date: series.bar(step).date,
            price: prev_price,
            action: trade_action,
            position: state.position,
            raw_return: step_return.raw,
            net_return: step_return.net,
            txn_cost: step_return.txn_cost,
            slippage: step_return.slippage,
            unrealized_pnl: state.unrealized_pnl,
        });
        rewards.push(step_return.net);
    }

    // Close any open position at the final bar so nothing is left unrealized.
    if !state.position.is_flat() {
        let final_price = match series.checked_close(end_index) {
            Ok(price) => price,
            Err(err) => return fail(records, rewards, err),
        };
        if let Err(err) = state.close(end_index, final_price) {
            return fail(records, rewards, err);
        }
        let (txn_cost, slippage) = costs.rates(true, CostRegime::Evaluation);
        records.push(TradeRecord {
            step: end_index,
            date: series.bar(end_index).date,
            price: final_price,
            action: TradeAction::Exit,
            position: state.position,
            raw_return: 0.0,
            net_return: -(txn_cost + slippage),
            txn_cost,
            slippage,
            unrealized_pnl: 0.0,
        });
        rewards.push(-(txn_cost + slippage));
    }

    RunResult {
        records,
        rewards,
        failure: None,
    }
}
