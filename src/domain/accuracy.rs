//! Forecast accuracy metrics.
//!
//! Independent of the trading engines: consumes (prediction, actual) pairs
//! aligned one day ahead (a prediction logged on day *t* targets the close
//! of day *t+1*) and reduces them to standard error metrics. Predictions
//! with no matching next-day actual are skipped rather than failing the run.

use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// One prediction-log row.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub predicted: f64,
}

/// A prediction joined with the actual it targets. `prev_actual` is the
/// close on the prediction's own date, used for directional accuracy; it is
/// `None` when that date has no close (weekend, holiday).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub date: NaiveDate,
    pub prediction: f64,
    pub actual: f64,
    pub prev_actual: Option<f64>,
}

/// Join predictions with next-day actuals.
///
/// `lookback_days` keeps only predictions within that many days of the
/// latest prediction date (measured from the log itself, so runs are
/// reproducible). Unmatched predictions are dropped.
pub fn align_next_day(
    predictions: &[PredictionRecord],
    actuals: &[(NaiveDate, f64)],
    lookback_days: Option<u32>,
) -> Vec<AlignedPair> {
    let closes: BTreeMap<NaiveDate, f64> = actuals.iter().copied().collect();

    let cutoff = lookback_days.and_then(|days| {
        let latest = predictions.iter().map(|p| p.date).max()?;
        latest.checked_sub_days(Days::new(u64::from(days)))
    });

    let mut pairs: Vec<AlignedPair> = predictions
        .iter()
        .filter(|p| cutoff.is_none_or(|c| p.date >= c))
        .filter_map(|p| {
            let target = p.date.checked_add_days(Days::new(1))?;
            let actual = *closes.get(&target)?;
            Some(AlignedPair {
                date: p.date,
                prediction: p.predicted,
                actual,
                prev_actual: closes.get(&p.date).copied(),
            })
        })
        .collect();
    pairs.sort_by_key(|p| p.date);
    pairs
}

/// Pearson correlation coefficient; 0.0 when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / n_f;
    let mean_y = ys[..n].iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Aggregate accuracy metrics. Percentages are expressed 0–100.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracySummary {
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub max_error: f64,
    pub directional_accuracy: f64,
    pub correlation: f64,
    pub count: usize,
    pub avg_actual: f64,
    pub avg_predicted: f64,
}

impl AccuracySummary {
    /// Compute the summary; `None` when fewer than 2 aligned pairs exist
    /// ("not computable" rather than an error).
    pub fn compute(pairs: &[AlignedPair]) -> Option<AccuracySummary> {
        if pairs.len() < 2 {
            return None;
        }
        let n = pairs.len() as f64;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut max_error = 0.0_f64;
        for pair in pairs {
            let err = pair.prediction - pair.actual;
            abs_sum += err.abs();
            sq_sum += err * err;
            pct_sum += err.abs() / pair.actual.abs().max(f64::EPSILON);
            max_error = max_error.max(err.abs());
        }

        let directional: Vec<bool> = pairs
            .iter()
            .filter_map(|pair| {
                let prev = pair.prev_actual?;
                Some(sign(pair.prediction - prev) == sign(pair.actual - prev))
            })
            .collect();
        let directional_accuracy = if directional.is_empty() {
            0.0
        } else {
            directional.iter().filter(|&&hit| hit).count() as f64 / directional.len() as f64
                * 100.0
        };

        let predictions: Vec<f64> = pairs.iter().map(|p| p.prediction).collect();
        let actuals: Vec<f64> = pairs.iter().map(|p| p.actual).collect();

        Some(AccuracySummary {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            mape: pct_sum / n * 100.0,
            max_error,
            directional_accuracy,
            correlation: pearson(&predictions, &actuals),
            count: pairs.len(),
            avg_actual: actuals.iter().sum::<f64>() / n,
            avg_predicted: predictions.iter().sum::<f64>() / n,
        })
    }

    /// Flat key→value rows for reports and CSV export.
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("mae", self.mae),
            ("rmse", self.rmse),
            ("mape", self.mape),
            ("max_error", self.max_error),
            ("directional_accuracy", self.directional_accuracy),
            ("correlation", self.correlation),
            ("total_predictions", self.count as f64),
            ("avg_actual_price", self.avg_actual),
            ("avg_predicted_price", self.avg_predicted),
        ]
    }
}
