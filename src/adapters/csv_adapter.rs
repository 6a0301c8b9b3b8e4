//! CSV file data adapter.
//!
//! Reads the engineered-feature series and the prediction log produced by
//! the upstream pipeline. Column mapping is header-driven: `date` and a
//! close column (`close_price` or `close`) are required; `forecast_price`,
//! `forecast_return`, and `action` are recognized when present; every other
//! column is carried as an auxiliary feature.

use crate::domain::accuracy::PredictionRecord;
use crate::domain::bar::{Bar, PriceSeries};
use crate::domain::error::AlphasimError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const RESERVED: [&str; 6] = [
    "date",
    "close_price",
    "close",
    "forecast_price",
    "forecast_return",
    "action",
];

#[derive(Debug)]
pub struct CsvDataAdapter {
    series_path: PathBuf,
    predictions_path: Option<PathBuf>,
}

struct ColumnMap {
    date: usize,
    close: usize,
    forecast_price: Option<usize>,
    forecast_return: Option<usize>,
    action: Option<usize>,
    /// (header index, name) of each feature column.
    features: Vec<(usize, String)>,
}

impl CsvDataAdapter {
    pub fn new(series_path: PathBuf) -> Self {
        Self {
            series_path,
            predictions_path: None,
        }
    }

    pub fn with_predictions(mut self, predictions_path: PathBuf) -> Self {
        self.predictions_path = Some(predictions_path);
        self
    }

    fn data_err(reason: String) -> AlphasimError {
        AlphasimError::Data { reason }
    }

    fn read_file(path: &PathBuf) -> Result<String, AlphasimError> {
        fs::read_to_string(path).map_err(|e| {
            Self::data_err(format!("failed to read {}: {}", path.display(), e))
        })
    }

    fn map_columns(headers: &csv::StringRecord) -> Result<ColumnMap, AlphasimError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let date = position("date")
            .ok_or_else(|| Self::data_err("missing date column".into()))?;
        let close = position("close_price")
            .or_else(|| position("close"))
            .ok_or_else(|| Self::data_err("missing close_price column".into()))?;

        let reserved_idx: Vec<usize> = RESERVED.iter().filter_map(|n| position(n)).collect();
        let features = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !reserved_idx.contains(i))
            .map(|(i, name)| (i, name.trim().to_string()))
            .collect();

        Ok(ColumnMap {
            date,
            close,
            forecast_price: position("forecast_price"),
            forecast_return: position("forecast_return"),
            action: position("action"),
            features,
        })
    }

    fn parse_date(value: &str, row: usize) -> Result<NaiveDate, AlphasimError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|e| Self::data_err(format!("row {row}: invalid date {value:?}: {e}")))
    }

    /// Empty cells become NaN so a mid-run gap is detected as such; a cell
    /// that is present but unparseable is a hard data error.
    fn parse_close(value: &str, row: usize) -> Result<f64, AlphasimError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(f64::NAN);
        }
        trimmed
            .parse()
            .map_err(|e| Self::data_err(format!("row {row}: invalid close {value:?}: {e}")))
    }

    fn parse_optional(value: Option<&str>, row: usize, what: &str) -> Result<Option<f64>, AlphasimError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|e| {
                Self::data_err(format!("row {row}: invalid {what} {s:?}: {e}"))
            }),
        }
    }

    /// Recorded policy actions from the series file's `action` column, for
    /// scripted replay. One entry per bar, in date order.
    pub fn fetch_actions(&self) -> Result<Vec<i64>, AlphasimError> {
        let content = Self::read_file(&self.series_path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?
            .clone();
        let columns = Self::map_columns(&headers)?;
        let action_idx = columns
            .action
            .ok_or_else(|| Self::data_err("missing action column".into()))?;

        let mut rows: Vec<(NaiveDate, i64)> = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?;
            let date = Self::parse_date(record.get(columns.date).unwrap_or(""), row)?;
            let action = record
                .get(action_idx)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|e| Self::data_err(format!("row {row}: invalid action: {e}")))?;
            rows.push((date, action));
        }
        rows.sort_by_key(|(date, _)| *date);
        Ok(rows.into_iter().map(|(_, action)| action).collect())
    }
}

impl DataPort for CsvDataAdapter {
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, AlphasimError> {
        let content = Self::read_file(&self.series_path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?
            .clone();
        let columns = Self::map_columns(&headers)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?;

            let date = Self::parse_date(record.get(columns.date).unwrap_or(""), row)?;
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let mut bar = Bar::new(
                date,
                Self::parse_close(record.get(columns.close).unwrap_or(""), row)?,
            );
            bar.forecast_price = Self::parse_optional(
                columns.forecast_price.and_then(|i| record.get(i)),
                row,
                "forecast_price",
            )?;
            bar.forecast_return = Self::parse_optional(
                columns.forecast_return.and_then(|i| record.get(i)),
                row,
                "forecast_return",
            )?;

            // feature cells degrade to 0.0, matching the upstream fillna
            bar.features = columns
                .features
                .iter()
                .map(|(i, _)| {
                    record
                        .get(*i)
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0.0)
                })
                .collect();
            bars.push(bar);
        }

        let feature_names = columns
            .features
            .iter()
            .map(|(_, name)| name.clone())
            .collect();
        PriceSeries::from_bars(bars, feature_names)
    }

    fn fetch_predictions(&self) -> Result<Vec<PredictionRecord>, AlphasimError> {
        let path = self.predictions_path.as_ref().ok_or_else(|| {
            Self::data_err("no prediction log configured".into())
        })?;
        let content = Self::read_file(path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?
            .clone();

        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let date_idx = position("date")
            .ok_or_else(|| Self::data_err("missing date column".into()))?;
        let pred_idx = position("predicted")
            .or_else(|| position("prediction"))
            .ok_or_else(|| Self::data_err("missing predicted column".into()))?;

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| Self::data_err(format!("CSV parse error: {e}")))?;
            let date = Self::parse_date(record.get(date_idx).unwrap_or(""), row)?;
            let predicted = record
                .get(pred_idx)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|e| Self::data_err(format!("row {row}: invalid prediction: {e}")))?;
            records.push(PredictionRecord { date, predicted });
        }
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    fn series_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphasimError> {
        let series = self.fetch_series(None, None)?;
        Ok(series
            .date_range()
            .map(|(first, last)| (first, last, series.len())))
    }
}
