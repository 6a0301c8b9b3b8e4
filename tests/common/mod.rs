#![allow(dead_code)]

use chrono::NaiveDate;

use alphasim::domain::accuracy::PredictionRecord;
use alphasim::domain::bar::{Bar, PriceSeries};
use alphasim::domain::error::AlphasimError;
use alphasim::ports::data_port::DataPort;
use alphasim::ports::policy_port::PolicyPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_date() -> NaiveDate {
    date(2024, 1, 1)
}

/// Daily bars from consecutive dates and the given closes.
pub fn make_series(prices: &[f64]) -> PriceSeries {
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Bar::new(start_date() + chrono::Duration::days(i as i64), p))
        .collect();
    PriceSeries::from_bars(bars, vec![]).unwrap()
}

/// Daily bars with closes and per-bar forecast prices (NaN = no forecast).
pub fn make_forecast_series(rows: &[(f64, f64)]) -> PriceSeries {
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, &(close, forecast))| {
            let mut bar = Bar::new(start_date() + chrono::Duration::days(i as i64), close);
            if !forecast.is_nan() {
                bar.forecast_price = Some(forecast);
            }
            bar
        })
        .collect();
    PriceSeries::from_bars(bars, vec![]).unwrap()
}

/// A gently trending series of `count` bars.
pub fn generate_series(count: usize, start_price: f64) -> PriceSeries {
    let prices: Vec<f64> = (0..count).map(|i| start_price + i as f64 * 0.5).collect();
    make_series(&prices)
}

/// In-memory data port for pipeline tests.
pub struct MockDataPort {
    pub series: Option<PriceSeries>,
    pub predictions: Vec<PredictionRecord>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            series: None,
            predictions: Vec::new(),
            error: None,
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series = Some(series);
        self
    }

    pub fn with_predictions(mut self, predictions: Vec<PredictionRecord>) -> Self {
        self.predictions = predictions;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, AlphasimError> {
        if let Some(reason) = &self.error {
            return Err(AlphasimError::Data {
                reason: reason.clone(),
            });
        }
        let series = self.series.clone().ok_or_else(|| AlphasimError::Data {
            reason: "no series configured".into(),
        })?;
        let bars = series
            .bars()
            .iter()
            .filter(|b| {
                start_date.is_none_or(|s| b.date >= s) && end_date.is_none_or(|e| b.date <= e)
            })
            .cloned()
            // from_bars re-derives the injected indicator columns
            .map(|b| Bar {
                features: Vec::new(),
                ..b
            })
            .collect();
        PriceSeries::from_bars(bars, vec![])
    }

    fn fetch_predictions(&self) -> Result<Vec<PredictionRecord>, AlphasimError> {
        if let Some(reason) = &self.error {
            return Err(AlphasimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.predictions.clone())
    }

    fn series_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphasimError> {
        let series = self.fetch_series(None, None)?;
        Ok(series
            .date_range()
            .map(|(first, last)| (first, last, series.len())))
    }
}

/// Always emits the same action index.
pub struct ConstPolicy(pub i64);

impl PolicyPort for ConstPolicy {
    fn predict(&mut self, _observation: &[f64]) -> Result<i64, String> {
        Ok(self.0)
    }
}
