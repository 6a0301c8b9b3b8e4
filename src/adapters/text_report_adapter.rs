//! Plain-text report adapter.
//!
//! Renders the trading-performance and prediction-accuracy reports as
//! fixed-width text tables and exports the per-step trade ledger as CSV.

use std::fs;
use std::path::Path;

use crate::domain::accuracy::AccuracySummary;
use crate::domain::error::AlphasimError;
use crate::domain::metrics::{drawdown, equity_curve, BuyAndHold, TradingSummary};
use crate::domain::simulation::TradeRecord;
use crate::ports::report_port::ReportPort;

const RULE: &str = "============================================================";
const THIN: &str = "------------------------------------------------------------";

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn render_trading(summary: &TradingSummary, baseline: &BuyAndHold) -> String {
        let outperformance = (summary.net_total_return - baseline.total_return) * 100.0;
        let sharpe_label = if summary.annualized {
            "Sharpe Ratio (annualized)"
        } else {
            "Sharpe Ratio (per step)"
        };

        let mut lines = Vec::new();
        lines.push(RULE.to_string());
        lines.push("TRADING STRATEGY PERFORMANCE".to_string());
        lines.push(RULE.to_string());
        lines.push(String::new());
        lines.push(format!("{:<34} {:>12} {:>12}", "Metric", "Strategy", "Buy & Hold"));
        lines.push(THIN.to_string());
        lines.push(format!(
            "{:<34} {:>12.2} {:>12.2}",
            "Initial Capital ($)", summary.initial_capital, baseline.initial_capital
        ));
        lines.push(format!(
            "{:<34} {:>12.2} {:>12.2}",
            "Final Value ($)", summary.final_value, baseline.final_value
        ));
        lines.push(format!(
            "{:<34} {:>11.2}% {:>11.2}%",
            "Total Return",
            summary.net_total_return * 100.0,
            baseline.total_return * 100.0
        ));
        lines.push(String::new());
        lines.push(format!("{:<34} {:>11.2}%", "Outperformance", outperformance));
        lines.push(String::new());
        lines.push("Strategy-Specific Metrics".to_string());
        lines.push(THIN.to_string());
        lines.push(format!(
            "{:<34} {:>11.2}%",
            "Gross Total Return",
            summary.gross_total_return * 100.0
        ));
        lines.push(format!("{:<34} {:>12.2}", sharpe_label, summary.sharpe));
        lines.push(format!(
            "{:<34} {:>11.2}%",
            "Maximum Drawdown",
            summary.max_drawdown * 100.0
        ));
        lines.push(format!(
            "{:<34} {:>12}",
            "Completed Trades", summary.completed_trades
        ));
        lines.push(format!(
            "{:<34} {:>11.1}%",
            "Win Rate",
            summary.win_rate * 100.0
        ));
        lines.push(format!(
            "{:<34} {:>12.5}",
            "Total Costs", summary.total_costs
        ));
        lines.push(format!(
            "{:<34} {:>12.6}",
            "Avg Cost / Step", summary.avg_cost_per_step
        ));
        lines.push(RULE.to_string());
        lines.join("\n")
    }

    pub fn render_accuracy(summary: &AccuracySummary) -> String {
        let mut lines = Vec::new();
        lines.push(RULE.to_string());
        lines.push("PREDICTION ACCURACY REPORT".to_string());
        lines.push(RULE.to_string());
        lines.push(String::new());
        lines.push(format!("Total Predictions: {}", summary.count));
        lines.push(String::new());
        lines.push(format!("{:<34} {:>15}", "Metric", "Value"));
        lines.push(THIN.to_string());
        lines.push(format!(
            "{:<34} {:>14.2}$",
            "Mean Absolute Error (MAE)", summary.mae
        ));
        lines.push(format!(
            "{:<34} {:>14.2}$",
            "Root Mean Squared Error (RMSE)", summary.rmse
        ));
        lines.push(format!(
            "{:<34} {:>14.2}%",
            "Mean Absolute % Error (MAPE)", summary.mape
        ));
        lines.push(format!("{:<34} {:>14.2}$", "Maximum Error", summary.max_error));
        lines.push(format!(
            "{:<34} {:>14.1}%",
            "Directional Accuracy", summary.directional_accuracy
        ));
        lines.push(format!(
            "{:<34} {:>15.3}",
            "Correlation (Pred vs Actual)", summary.correlation
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<34} {:>14.2}$",
            "Average Actual Price", summary.avg_actual
        ));
        lines.push(format!(
            "{:<34} {:>14.2}$",
            "Average Predicted Price", summary.avg_predicted
        ));
        lines.push(RULE.to_string());
        lines.join("\n")
    }

    /// Gross/net equity and net drawdown per step, as CSV.
    pub fn render_equity(records: &[TradeRecord]) -> Result<String, AlphasimError> {
        let curve = equity_curve(records);
        let net: Vec<f64> = curve.iter().map(|p| p.net).collect();
        let drawdowns = drawdown(&net);

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["step", "date", "gross_equity", "net_equity", "net_drawdown"])
            .map_err(|e| AlphasimError::Data {
                reason: format!("equity write error: {e}"),
            })?;
        for (point, dd) in curve.iter().zip(&drawdowns) {
            wtr.write_record([
                point.step.to_string(),
                point.date.to_string(),
                point.gross.to_string(),
                point.net.to_string(),
                dd.to_string(),
            ])
            .map_err(|e| AlphasimError::Data {
                reason: format!("equity write error: {e}"),
            })?;
        }

        let bytes = wtr.into_inner().map_err(|e| AlphasimError::Data {
            reason: format!("equity write error: {e}"),
        })?;
        String::from_utf8(bytes).map_err(|e| AlphasimError::Data {
            reason: format!("equity encoding error: {e}"),
        })
    }

    pub fn render_ledger(records: &[TradeRecord]) -> Result<String, AlphasimError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "step",
            "date",
            "price",
            "action",
            "position",
            "raw_return",
            "net_return",
            "txn_cost",
            "slippage",
            "unrealized_pnl",
        ])
        .map_err(|e| AlphasimError::Data {
            reason: format!("ledger write error: {e}"),
        })?;

        for r in records {
            wtr.write_record([
                r.step.to_string(),
                r.date.to_string(),
                r.price.to_string(),
                r.action.as_str().to_string(),
                (r.position.direction() as i64).to_string(),
                r.raw_return.to_string(),
                r.net_return.to_string(),
                r.txn_cost.to_string(),
                r.slippage.to_string(),
                r.unrealized_pnl.to_string(),
            ])
            .map_err(|e| AlphasimError::Data {
                reason: format!("ledger write error: {e}"),
            })?;
        }

        let bytes = wtr.into_inner().map_err(|e| AlphasimError::Data {
            reason: format!("ledger write error: {e}"),
        })?;
        String::from_utf8(bytes).map_err(|e| AlphasimError::Data {
            reason: format!("ledger encoding error: {e}"),
        })
    }
}

impl ReportPort for TextReportAdapter {
    fn write_trading(
        &self,
        summary: &TradingSummary,
        baseline: &BuyAndHold,
        output_path: &Path,
    ) -> Result<(), AlphasimError> {
        fs::write(output_path, Self::render_trading(summary, baseline))?;
        Ok(())
    }

    fn write_accuracy(
        &self,
        summary: &AccuracySummary,
        output_path: &Path,
    ) -> Result<(), AlphasimError> {
        fs::write(output_path, Self::render_accuracy(summary))?;
        Ok(())
    }

    fn write_ledger(
        &self,
        records: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), AlphasimError> {
        fs::write(output_path, Self::render_ledger(records)?)?;
        Ok(())
    }

    fn write_equity(
        &self,
        records: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), AlphasimError> {
        fs::write(output_path, Self::render_equity(records)?)?;
        Ok(())
    }
}
