//! Configuration validation.
//!
//! Validates all config fields before a simulation or backtest runs, so bad
//! values fail fast with a pointed message instead of surfacing mid-run.

use crate::domain::error::AlphasimError;
use crate::ports::config_port::ConfigPort;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    validate_initial_capital(config)?;
    validate_min_holding_days(config)?;
    validate_observation_window(config)?;
    validate_costs(config)?;
    validate_cost_timing(config)?;
    Ok(())
}

pub fn validate_reward_config(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    validate_reward_mode(config)?;
    validate_reward_window(config)?;
    validate_reward_coefficients(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    validate_rule_mode(config)?;
    validate_lookback_days(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> AlphasimError {
    AlphasimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    let value = config.get_double("simulation", "initial_capital", 10_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_min_holding_days(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    let value = config.get_int("simulation", "min_holding_days", 1);
    if value < 1 {
        return Err(invalid(
            "simulation",
            "min_holding_days",
            "min_holding_days must be at least 1",
        ));
    }
    Ok(())
}

fn validate_observation_window(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    let value = config.get_int("simulation", "observation_window", 1);
    if value < 1 {
        return Err(invalid(
            "simulation",
            "observation_window",
            "observation_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    for key in [
        "transaction_cost",
        "slippage",
        "curriculum_transaction_cost",
        "curriculum_slippage",
    ] {
        let value = config.get_double("costs", key, 0.0);
        if value < 0.0 {
            return Err(invalid("costs", key, "cost rates must be non-negative"));
        }
    }
    Ok(())
}

fn validate_cost_timing(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    match config.get_string("costs", "timing") {
        None => Ok(()),
        Some(s) if matches!(s.as_str(), "on_trade" | "per_step") => Ok(()),
        Some(_) => Err(invalid(
            "costs",
            "timing",
            "timing must be on_trade or per_step",
        )),
    }
}

fn validate_reward_mode(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    match config.get_string("reward", "mode") {
        None => Ok(()),
        Some(s) if matches!(s.as_str(), "net" | "risk_adjusted") => Ok(()),
        Some(_) => Err(invalid(
            "reward",
            "mode",
            "mode must be net or risk_adjusted",
        )),
    }
}

fn validate_reward_window(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    let value = config.get_int("reward", "window", 30);
    if value < 1 {
        return Err(invalid("reward", "window", "window must be at least 1"));
    }
    Ok(())
}

fn validate_reward_coefficients(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    for key in ["holding_coef", "momentum_coef", "vol_penalty", "align_coef"] {
        let value = config.get_double("reward", key, 0.0);
        if !value.is_finite() {
            return Err(invalid("reward", key, "coefficient must be finite"));
        }
    }
    let min_trade_hold = config.get_int("reward", "min_trade_hold", 1);
    if min_trade_hold < 0 {
        return Err(invalid(
            "reward",
            "min_trade_hold",
            "min_trade_hold must be non-negative",
        ));
    }
    Ok(())
}

fn validate_rule_mode(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    match config.get_string("backtest", "rule_mode") {
        None => Ok(()),
        Some(s) if matches!(s.as_str(), "long_cash" | "long_short") => Ok(()),
        Some(_) => Err(invalid(
            "backtest",
            "rule_mode",
            "rule_mode must be long_cash or long_short",
        )),
    }
}

fn validate_lookback_days(config: &dyn ConfigPort) -> Result<(), AlphasimError> {
    let value = config.get_int("backtest", "lookback_days", 180);
    if value < 1 {
        return Err(invalid(
            "backtest",
            "lookback_days",
            "lookback_days must be positive",
        ));
    }
    Ok(())
}
