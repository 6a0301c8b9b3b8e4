//! Equity curves and risk/performance metrics over a trade ledger.

use chrono::NaiveDate;

use crate::domain::position::Position;
use crate::domain::simulation::{TradeAction, TradeRecord};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Guard added to the volatility denominator of the Sharpe ratio.
const SHARPE_EPS: f64 = 1e-9;

/// One point of the compounded equity curves (1.0 before the first step).
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub step: usize,
    pub date: NaiveDate,
    pub gross: f64,
    pub net: f64,
}

/// Gross and net equity compounded from 1.0 across the ledger.
pub fn equity_curve(records: &[TradeRecord]) -> Vec<EquityPoint> {
    let mut gross = 1.0;
    let mut net = 1.0;
    records
        .iter()
        .map(|r| {
            gross *= 1.0 + r.raw_return;
            net *= 1.0 + r.net_return;
            EquityPoint {
                step: r.step,
                date: r.date,
                gross,
                net,
            }
        })
        .collect()
}

/// Per-point drawdown against the running maximum. Always ≤ 0.
pub fn drawdown(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    equity
        .iter()
        .map(|&e| {
            if e > peak {
                peak = e;
            }
            (e - peak) / peak
        })
        .collect()
}

/// Deepest drawdown (the minimum of the drawdown series); 0.0 when empty.
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0, f64::min)
}

/// Sharpe ratio of a return series.
///
/// `periods_per_year = Some(252.0)` annualizes a daily series (the rule
/// backtest reports this); `None` yields the un-annualized per-step ratio
/// (the policy evaluator reports that one). The two differ numerically by
/// the sqrt factor, so callers must say which they mean.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: Option<f64>) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    let ratio = mean / (variance.sqrt() + SHARPE_EPS);
    match periods_per_year {
        Some(periods) => ratio * periods.sqrt(),
        None => ratio,
    }
}

/// One opening event paired with its closing event, with the net return
/// compounded over the held records (flip and exit costs included).
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTrade {
    pub open_step: usize,
    pub close_step: usize,
    pub direction: Position,
    pub net_return: f64,
}

/// Pair opening and closing events from the ledger. A position still open
/// after the final record is not a completed trade.
pub fn completed_trades(records: &[TradeRecord]) -> Vec<CompletedTrade> {
    let mut trades = Vec::new();
    let mut open: Option<(usize, Position, f64)> = None;

    for record in records {
        match record.action {
            TradeAction::EnterLong | TradeAction::EnterShort => {
                if let Some((open_step, direction, factor)) = open.take() {
                    trades.push(CompletedTrade {
                        open_step,
                        close_step: record.step,
                        direction,
                        net_return: factor - 1.0,
                    });
                }
                open = Some((record.step, record.position, 1.0 + record.net_return));
            }
            TradeAction::Exit => {
                if let Some((open_step, direction, factor)) = open.take() {
                    trades.push(CompletedTrade {
                        open_step,
                        close_step: record.step,
                        direction,
                        net_return: factor * (1.0 + record.net_return) - 1.0,
                    });
                }
            }
            TradeAction::Hold => {
                if let Some((_, _, factor)) = open.as_mut() {
                    *factor *= 1.0 + record.net_return;
                }
            }
        }
    }
    trades
}

/// Fraction of completed trades with a positive cumulative net return.
pub fn win_rate(trades: &[CompletedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.net_return > 0.0).count();
    wins as f64 / trades.len() as f64
}

/// Buy-and-hold baseline over the same price window. Never affected by the
/// strategy's ledger or cost configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyAndHold {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
}

pub fn buy_and_hold(first_price: f64, last_price: f64, initial_capital: f64) -> BuyAndHold {
    let final_value = initial_capital * (last_price / first_price);
    BuyAndHold {
        initial_capital,
        final_value,
        total_return: (final_value - initial_capital) / initial_capital,
    }
}

/// Aggregate trading metrics for one completed (or prefix of a) run.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingSummary {
    pub initial_capital: f64,
    pub gross_total_return: f64,
    pub net_total_return: f64,
    pub final_value: f64,
    pub sharpe: f64,
    /// Whether `sharpe` carries the sqrt(252) annualization factor.
    pub annualized: bool,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub completed_trades: usize,
    pub total_costs: f64,
    pub avg_cost_per_step: f64,
}

impl TradingSummary {
    /// Compute the summary from a ledger. Returns `None` for an empty ledger
    /// ("no data yet"), distinct from a failed run.
    pub fn compute(
        records: &[TradeRecord],
        initial_capital: f64,
        periods_per_year: Option<f64>,
    ) -> Option<TradingSummary> {
        if records.is_empty() {
            return None;
        }

        let curve = equity_curve(records);
        let gross_total_return = curve.last().map(|p| p.gross - 1.0).unwrap_or(0.0);
        let net_total_return = curve.last().map(|p| p.net - 1.0).unwrap_or(0.0);

        let net_equity: Vec<f64> = curve.iter().map(|p| p.net).collect();
        let net_returns: Vec<f64> = records.iter().map(|r| r.net_return).collect();
        let trades = completed_trades(records);
        let total_costs: f64 = records.iter().map(|r| r.txn_cost + r.slippage).sum();

        Some(TradingSummary {
            initial_capital,
            gross_total_return,
            net_total_return,
            final_value: initial_capital * (1.0 + net_total_return),
            sharpe: sharpe_ratio(&net_returns, periods_per_year),
            annualized: periods_per_year.is_some(),
            max_drawdown: max_drawdown(&drawdown(&net_equity)),
            win_rate: win_rate(&trades),
            completed_trades: trades.len(),
            total_costs,
            avg_cost_per_step: total_costs / records.len() as f64,
        })
    }

    /// Flat key→value rows for reports and CSV export.
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("initial_capital", self.initial_capital),
            ("final_value", self.final_value),
            ("gross_total_return", self.gross_total_return),
            ("net_total_return", self.net_total_return),
            ("sharpe", self.sharpe),
            ("max_drawdown", self.max_drawdown),
            ("win_rate", self.win_rate),
            ("completed_trades", self.completed_trades as f64),
            ("total_costs", self.total_costs),
            ("avg_cost_per_step", self.avg_cost_per_step),
        ]
    }
}
