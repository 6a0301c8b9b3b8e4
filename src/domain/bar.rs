//! Price series representation.
//!
//! A [`PriceSeries`] owns the time-ordered bars consumed by the simulation:
//! one close price per date, optional forecast columns, and named auxiliary
//! feature columns used only to build policy observations. Derived indicator
//! columns are injected at construction when the feature pipeline did not
//! supply them.

use chrono::NaiveDate;

use crate::domain::error::AlphasimError;
use crate::domain::indicators::{momentum_ratio, rolling_std, simple_returns};

/// Column name for per-bar simple returns.
pub const PRICE_RETURN: &str = "price_return";
/// Column name for the 7-bar momentum ratio.
pub const MOMENTUM: &str = "momentum_7";
/// Column name for the rolling 30-bar volatility of returns.
pub const VOLATILITY: &str = "volatility_30";

pub const MOMENTUM_WINDOW: usize = 7;
pub const VOLATILITY_WINDOW: usize = 30;

/// One row of the time series. Immutable once the series is built.
#[derive(Debug, Clone)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
    pub forecast_price: Option<f64>,
    pub forecast_return: Option<f64>,
    pub features: Vec<f64>,
}

impl Bar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Bar {
            date,
            close,
            forecast_price: None,
            forecast_return: None,
            features: Vec::new(),
        }
    }
}

/// Date-ordered series of bars with named feature columns.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
    feature_names: Vec<String>,
}

impl PriceSeries {
    /// Build a series from raw bars.
    ///
    /// Bars are sorted by date (stable); duplicate dates are rejected since a
    /// date-aligned equity curve cannot absorb them. Every bar must carry one
    /// value per feature column. The derived columns `price_return`,
    /// `momentum_7`, and `volatility_30` are appended when absent.
    pub fn from_bars(
        mut bars: Vec<Bar>,
        feature_names: Vec<String>,
    ) -> Result<Self, AlphasimError> {
        for bar in &bars {
            if bar.features.len() != feature_names.len() {
                return Err(AlphasimError::Data {
                    reason: format!(
                        "bar {} has {} feature values, expected {}",
                        bar.date,
                        bar.features.len(),
                        feature_names.len()
                    ),
                });
            }
        }

        bars.sort_by_key(|b| b.date);
        for pair in bars.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(AlphasimError::Data {
                    reason: format!("duplicate date {} in series", pair[0].date),
                });
            }
        }

        let mut series = PriceSeries {
            bars,
            feature_names,
        };
        series.ensure_indicators();
        Ok(series)
    }

    fn ensure_indicators(&mut self) {
        if self.bars.is_empty() {
            return;
        }
        let closes: Vec<f64> = self.bars.iter().map(|b| b.close).collect();
        let returns = simple_returns(&closes);

        if !self.has_column(PRICE_RETURN) {
            self.push_column(PRICE_RETURN, returns.clone());
        }
        if !self.has_column(MOMENTUM) {
            self.push_column(MOMENTUM, momentum_ratio(&closes, MOMENTUM_WINDOW));
        }
        if !self.has_column(VOLATILITY) {
            self.push_column(VOLATILITY, rolling_std(&returns, VOLATILITY_WINDOW));
        }
    }

    fn push_column(&mut self, name: &str, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.bars.len());
        for (bar, value) in self.bars.iter_mut().zip(values) {
            bar.features.push(value);
        }
        self.feature_names.push(name.to_string());
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.feature_names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, step: usize) -> &Bar {
        &self.bars[step]
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn close(&self, step: usize) -> f64 {
        self.bars[step].close
    }

    /// Close price with the validity checks the simulation requires:
    /// NaN is a data gap, a non-positive price is invalid input.
    pub fn checked_close(&self, step: usize) -> Result<f64, AlphasimError> {
        let price = self.bars[step].close;
        if price.is_nan() {
            return Err(AlphasimError::DataGap {
                step,
                what: "missing close price".into(),
            });
        }
        if price <= 0.0 {
            return Err(AlphasimError::InvalidPrice { step, price });
        }
        Ok(price)
    }

    /// Forecast price for a bar, deriving it from `forecast_return` when only
    /// the return form is present.
    pub fn forecast_price(&self, step: usize) -> Option<f64> {
        let bar = &self.bars[step];
        bar.forecast_price
            .or_else(|| bar.forecast_return.map(|r| bar.close * (1.0 + r)))
    }

    /// Forecast return for a bar, deriving it from `forecast_price` when only
    /// the price form is present.
    pub fn forecast_return(&self, step: usize) -> Option<f64> {
        let bar = &self.bars[step];
        bar.forecast_return.or_else(|| {
            bar.forecast_price.and_then(|fp| {
                if bar.close > 0.0 {
                    Some(fp / bar.close - 1.0)
                } else {
                    None
                }
            })
        })
    }

    pub fn feature(&self, step: usize, name: &str) -> Option<f64> {
        let idx = self.feature_names.iter().position(|n| n == name)?;
        self.bars[step].features.get(idx).copied()
    }

    pub fn momentum(&self, step: usize) -> Option<f64> {
        self.feature(step, MOMENTUM)
    }

    pub fn volatility(&self, step: usize) -> Option<f64> {
        self.feature(step, VOLATILITY)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn make_series(prices: &[f64]) -> PriceSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::new(date(i as u32 + 1), p))
            .collect();
        PriceSeries::from_bars(bars, vec![]).unwrap()
    }

    #[test]
    fn from_bars_sorts_by_date() {
        let bars = vec![
            Bar::new(date(3), 102.0),
            Bar::new(date(1), 100.0),
            Bar::new(date(2), 101.0),
        ];
        let series = PriceSeries::from_bars(bars, vec![]).unwrap();
        assert_eq!(series.close(0), 100.0);
        assert_eq!(series.close(2), 102.0);
    }

    #[test]
    fn from_bars_rejects_duplicate_dates() {
        let bars = vec![Bar::new(date(1), 100.0), Bar::new(date(1), 101.0)];
        let result = PriceSeries::from_bars(bars, vec![]);
        assert!(matches!(result, Err(AlphasimError::Data { .. })));
    }

    #[test]
    fn from_bars_rejects_feature_length_mismatch() {
        let mut bar = Bar::new(date(1), 100.0);
        bar.features = vec![1.0];
        let result = PriceSeries::from_bars(vec![bar], vec![]);
        assert!(matches!(result, Err(AlphasimError::Data { .. })));
    }

    #[test]
    fn derived_columns_are_injected() {
        let series = make_series(&[100.0, 110.0, 99.0]);
        assert!(series.has_column(PRICE_RETURN));
        assert!(series.has_column(MOMENTUM));
        assert!(series.has_column(VOLATILITY));
        assert!((series.feature(1, PRICE_RETURN).unwrap() - 0.10).abs() < 1e-12);
        assert!((series.momentum(1).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn existing_columns_are_not_overwritten() {
        let mut bars = vec![Bar::new(date(1), 100.0), Bar::new(date(2), 200.0)];
        for bar in &mut bars {
            bar.features = vec![42.0];
        }
        let series =
            PriceSeries::from_bars(bars, vec![PRICE_RETURN.to_string()]).unwrap();
        assert!((series.feature(1, PRICE_RETURN).unwrap() - 42.0).abs() < f64::EPSILON);
        // only momentum and volatility were appended
        assert_eq!(series.feature_names().len(), 3);
    }

    #[test]
    fn checked_close_flags_nan_as_gap() {
        let series = make_series(&[100.0, f64::NAN]);
        match series.checked_close(1) {
            Err(AlphasimError::DataGap { step, .. }) => assert_eq!(step, 1),
            other => panic!("expected DataGap, got {other:?}"),
        }
    }

    #[test]
    fn checked_close_flags_non_positive_price() {
        let series = make_series(&[100.0, -5.0]);
        match series.checked_close(1) {
            Err(AlphasimError::InvalidPrice { step, price }) => {
                assert_eq!(step, 1);
                assert!((price - (-5.0)).abs() < f64::EPSILON);
            }
            other => panic!("expected InvalidPrice, got {other:?}"),
        }
    }

    #[test]
    fn forecast_price_derived_from_return() {
        let mut bar = Bar::new(date(1), 100.0);
        bar.forecast_return = Some(0.02);
        let series = PriceSeries::from_bars(vec![bar], vec![]).unwrap();
        assert!((series.forecast_price(0).unwrap() - 102.0).abs() < 1e-12);
    }

    #[test]
    fn forecast_return_derived_from_price() {
        let mut bar = Bar::new(date(1), 100.0);
        bar.forecast_price = Some(95.0);
        let series = PriceSeries::from_bars(vec![bar], vec![]).unwrap();
        assert!((series.forecast_return(0).unwrap() - (-0.05)).abs() < 1e-12);
    }

    #[test]
    fn forecast_absent_is_none() {
        let series = make_series(&[100.0]);
        assert!(series.forecast_price(0).is_none());
        assert!(series.forecast_return(0).is_none());
    }

    #[test]
    fn date_range_spans_series() {
        let series = make_series(&[100.0, 101.0, 102.0]);
        assert_eq!(series.date_range(), Some((date(1), date(3))));
    }
}
