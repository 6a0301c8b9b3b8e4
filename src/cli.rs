//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::policy_adapter::{ForecastPolicy, ScriptedPolicy};
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::accuracy::{align_next_day, AccuracySummary};
use crate::domain::backtest::{run_rule_backtest, RuleBacktestConfig, RuleMode};
use crate::domain::bar::PriceSeries;
use crate::domain::config_validation::{
    validate_backtest_config, validate_reward_config, validate_simulation_config,
};
use crate::domain::costs::{CostModel, CostRates, CostRegime, CostTiming};
use crate::domain::error::AlphasimError;
use crate::domain::metrics::{buy_and_hold, BuyAndHold, TradingSummary, TRADING_DAYS_PER_YEAR};
use crate::domain::observation::ObservationBuilder;
use crate::domain::reward::{RewardMode, RewardParams};
use crate::domain::simulation::{RunResult, SimulationConfig, Simulator};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::policy_port::PolicyPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "alphasim", about = "Commodity forecast trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the forecast-threshold trading backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        ledger: Option<PathBuf>,
        #[arg(long)]
        equity: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Replay a policy over the historical series
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Policy source: "forecast" follows the forecast direction,
        /// "actions" replays the series file's action column
        #[arg(long, default_value = "forecast")]
        policy: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        ledger: Option<PathBuf>,
        #[arg(long)]
        equity: Option<PathBuf>,
    },
    /// Run the prediction-accuracy backtest
    Accuracy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of the configured series
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            ledger,
            equity,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_backtest(
                    &config,
                    output.as_deref(),
                    ledger.as_deref(),
                    equity.as_deref(),
                )
            }
        }
        Command::Evaluate {
            config,
            policy,
            output,
            ledger,
            equity,
        } => run_evaluate(
            &config,
            &policy,
            output.as_deref(),
            ledger.as_deref(),
            equity.as_deref(),
        ),
        Command::Accuracy { config, output } => run_accuracy(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = AlphasimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), AlphasimError> {
    validate_simulation_config(adapter)?;
    validate_reward_config(adapter)?;
    validate_backtest_config(adapter)?;
    Ok(())
}

pub fn build_data_adapter(
    adapter: &dyn ConfigPort,
) -> Result<CsvDataAdapter, AlphasimError> {
    let series_path =
        adapter
            .get_string("data", "series_path")
            .ok_or_else(|| AlphasimError::ConfigMissing {
                section: "data".into(),
                key: "series_path".into(),
            })?;
    let mut data = CsvDataAdapter::new(PathBuf::from(series_path));
    if let Some(predictions) = adapter.get_string("data", "predictions_path") {
        data = data.with_predictions(PathBuf::from(predictions));
    }
    Ok(data)
}

pub fn build_cost_model(adapter: &dyn ConfigPort) -> CostModel {
    let timing = match adapter.get_string("costs", "timing").as_deref() {
        Some("per_step") => CostTiming::PerStep,
        _ => CostTiming::OnTrade,
    };
    CostModel::new(
        CostRates::new(
            adapter.get_double("costs", "transaction_cost", 0.0003),
            adapter.get_double("costs", "slippage", 0.0007),
        ),
        CostRates::new(
            adapter.get_double("costs", "curriculum_transaction_cost", 0.0001),
            adapter.get_double("costs", "curriculum_slippage", 0.0002),
        ),
        timing,
    )
}

pub fn build_reward_params(adapter: &dyn ConfigPort) -> RewardParams {
    let mode = match adapter.get_string("reward", "mode").as_deref() {
        Some("risk_adjusted") => RewardMode::RiskAdjusted,
        _ => RewardMode::Net,
    };
    RewardParams {
        mode,
        window: adapter.get_int("reward", "window", 30).max(1) as usize,
        holding_coef: adapter.get_double("reward", "holding_coef", 0.0),
        min_trade_hold: adapter.get_int("reward", "min_trade_hold", 1).max(0) as u32,
        momentum_coef: adapter.get_double("reward", "momentum_coef", 0.0),
        vol_penalty: adapter.get_double("reward", "vol_penalty", 0.0),
        align_coef: adapter.get_double("reward", "align_coef", 0.0),
        ..RewardParams::default()
    }
}

fn parse_config_date(
    adapter: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, AlphasimError> {
    match adapter.get_string("simulation", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map(Some).map_err(|_| {
            AlphasimError::ConfigInvalid {
                section: "simulation".into(),
                key: key.into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        }),
    }
}

fn fetch_series_window(
    adapter: &dyn ConfigPort,
    data: &CsvDataAdapter,
) -> Result<PriceSeries, AlphasimError> {
    let start = parse_config_date(adapter, "start_date")?;
    let end = parse_config_date(adapter, "end_date")?;
    data.fetch_series(start, end)
}

fn print_trading_summary(summary: &TradingSummary, baseline: &BuyAndHold) {
    eprintln!("\n=== Trading Results ===");
    eprintln!(
        "Strategy Return:  {:+.2}%",
        summary.net_total_return * 100.0
    );
    eprintln!("Buy & Hold:       {:+.2}%", baseline.total_return * 100.0);
    eprintln!(
        "Outperformance:   {:+.2}%",
        (summary.net_total_return - baseline.total_return) * 100.0
    );
    let sharpe_label = if summary.annualized {
        "annualized"
    } else {
        "per step"
    };
    eprintln!("Sharpe ({}):  {:.2}", sharpe_label, summary.sharpe);
    eprintln!("Max Drawdown:     {:.2}%", summary.max_drawdown * 100.0);
    eprintln!("Completed Trades: {}", summary.completed_trades);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Total Costs:      {:.5}", summary.total_costs);
}

/// Report whatever prefix a run produced. Returns the exit code: success for
/// a complete run, the failure's code otherwise.
fn report_run(
    result: &RunResult,
    series: &PriceSeries,
    initial_capital: f64,
    periods_per_year: Option<f64>,
    output_path: Option<&std::path::Path>,
    ledger_path: Option<&std::path::Path>,
    equity_path: Option<&std::path::Path>,
) -> ExitCode {
    if let Some(err) = &result.failure {
        eprintln!("error: {err}");
        if !result.records.is_empty() {
            eprintln!(
                "note: reporting partial results for {} completed steps",
                result.records.len()
            );
        }
    }

    let reporter = TextReportAdapter;
    match TradingSummary::compute(&result.records, initial_capital, periods_per_year) {
        Some(summary) => {
            let baseline = buy_and_hold(
                series.close(0),
                series.close(series.len() - 1),
                initial_capital,
            );
            print_trading_summary(&summary, &baseline);

            if let Some(path) = output_path {
                match reporter.write_trading(&summary, &baseline, path) {
                    Ok(()) => eprintln!("\nReport written to: {}", path.display()),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                }
            }
            if let Some(path) = ledger_path {
                match reporter.write_ledger(&result.records, path) {
                    Ok(()) => eprintln!("Ledger written to: {}", path.display()),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                }
            }
            if let Some(path) = equity_path {
                match reporter.write_equity(&result.records, path) {
                    Ok(()) => eprintln!("Equity curve written to: {}", path.display()),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                }
            }
        }
        None => eprintln!("No completed steps: nothing to report"),
    }

    match &result.failure {
        Some(err) => err.into(),
        None => ExitCode::SUCCESS,
    }
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&std::path::Path>,
    ledger_path: Option<&std::path::Path>,
    equity_path: Option<&std::path::Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let data = match build_data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let series = match fetch_series_window(&adapter, &data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let rule_mode = match adapter.get_string("backtest", "rule_mode").as_deref() {
        Some("long_short") => RuleMode::LongShort,
        _ => RuleMode::LongCash,
    };
    let rule_config = RuleBacktestConfig {
        mode: rule_mode,
        min_holding_days: adapter.get_int("simulation", "min_holding_days", 1).max(1) as u32,
        ..RuleBacktestConfig::default()
    };
    let costs = build_cost_model(&adapter);
    let initial_capital = adapter.get_double("simulation", "initial_capital", 10_000.0);

    eprintln!(
        "Running rule backtest: {} bars, {:?} mode",
        series.len(),
        rule_mode
    );
    let result = run_rule_backtest(&series, &costs, &rule_config);

    // The rule backtest reports the annualized Sharpe ratio of daily returns.
    report_run(
        &result,
        &series,
        initial_capital,
        Some(TRADING_DAYS_PER_YEAR),
        output_path,
        ledger_path,
        equity_path,
    )
}

fn run_evaluate(
    config_path: &PathBuf,
    policy_kind: &str,
    output_path: Option<&std::path::Path>,
    ledger_path: Option<&std::path::Path>,
    equity_path: Option<&std::path::Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let data = match build_data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let series = match fetch_series_window(&adapter, &data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let window = adapter.get_int("simulation", "observation_window", 1).max(1) as usize;
    let observations = ObservationBuilder::new(window, true);

    let mut policy: Box<dyn PolicyPort> = match policy_kind {
        "forecast" => Box::new(ForecastPolicy::new(&series).with_offset(observations.min_step())),
        "actions" => match data.fetch_actions() {
            Ok(actions) => {
                Box::new(ScriptedPolicy::new(actions).with_offset(observations.min_step()))
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
        other => {
            eprintln!("error: unknown policy {other:?} (expected forecast or actions)");
            return ExitCode::from(2);
        }
    };

    let sim_config = SimulationConfig {
        min_holding_days: adapter.get_int("simulation", "min_holding_days", 1).max(1) as u32,
        regime: CostRegime::Evaluation,
        ..SimulationConfig::default()
    };
    let mut simulator = match Simulator::new(
        &series,
        build_cost_model(&adapter),
        build_reward_params(&adapter),
        sim_config,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Evaluating {} policy: {} bars, window {}",
        policy_kind,
        series.len(),
        window
    );
    let result = simulator.run(policy.as_mut(), &observations);
    let initial_capital = adapter.get_double("simulation", "initial_capital", 10_000.0);

    // The policy evaluator reports the un-annualized per-step Sharpe ratio.
    report_run(
        &result,
        &series,
        initial_capital,
        None,
        output_path,
        ledger_path,
        equity_path,
    )
}

fn run_accuracy(config_path: &PathBuf, output_path: Option<&std::path::Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let data = match build_data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let predictions = match data.fetch_predictions() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let series = match data.fetch_series(None, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let actuals: Vec<(NaiveDate, f64)> = series
        .bars()
        .iter()
        .filter(|b| !b.close.is_nan())
        .map(|b| (b.date, b.close))
        .collect();

    let lookback = adapter.get_int("backtest", "lookback_days", 180).max(1) as u32;
    eprintln!(
        "Aligning {} predictions against {} closes (lookback {} days)",
        predictions.len(),
        actuals.len(),
        lookback
    );
    let pairs = align_next_day(&predictions, &actuals, Some(lookback));

    let summary = match AccuracySummary::compute(&pairs) {
        Some(s) => s,
        None => {
            let err = AlphasimError::InsufficientData {
                have: pairs.len(),
                need: 2,
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    eprintln!("\n=== Prediction Accuracy ===");
    eprintln!("MAE:                  {:.2}", summary.mae);
    eprintln!("RMSE:                 {:.2}", summary.rmse);
    eprintln!("MAPE:                 {:.2}%", summary.mape);
    eprintln!("Directional Accuracy: {:.1}%", summary.directional_accuracy);
    eprintln!("Correlation:          {:.3}", summary.correlation);
    eprintln!("Aligned Pairs:        {}", summary.count);

    if let Some(path) = output_path {
        let reporter = TextReportAdapter;
        match reporter.write_accuracy(&summary, path) {
            Ok(()) => eprintln!("\nReport written to: {}", path.display()),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = build_data_adapter(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let data = match build_data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data.series_range() {
        Ok(Some((first, last, count))) => {
            println!("{} bars, {} to {}", count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("no data found");
            ExitCode::from(5)
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
