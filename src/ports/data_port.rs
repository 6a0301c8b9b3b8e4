//! Data access port trait.

use chrono::NaiveDate;

use crate::domain::accuracy::PredictionRecord;
use crate::domain::bar::PriceSeries;
use crate::domain::error::AlphasimError;

pub trait DataPort {
    /// Fetch the price series, optionally restricted to a date window.
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, AlphasimError>;

    /// Fetch the prediction log for accuracy backtesting.
    fn fetch_predictions(&self) -> Result<Vec<PredictionRecord>, AlphasimError>;

    /// Date range and bar count of the available series, if any.
    fn series_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphasimError>;
}
