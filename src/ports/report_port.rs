//! Report generation port trait.

use std::path::Path;

use crate::domain::accuracy::AccuracySummary;
use crate::domain::error::AlphasimError;
use crate::domain::metrics::{BuyAndHold, TradingSummary};
use crate::domain::simulation::TradeRecord;

/// Port for writing run reports and the trade ledger.
pub trait ReportPort {
    fn write_trading(
        &self,
        summary: &TradingSummary,
        baseline: &BuyAndHold,
        output_path: &Path,
    ) -> Result<(), AlphasimError>;

    fn write_accuracy(
        &self,
        summary: &AccuracySummary,
        output_path: &Path,
    ) -> Result<(), AlphasimError>;

    fn write_ledger(
        &self,
        records: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), AlphasimError>;

    fn write_equity(
        &self,
        records: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), AlphasimError>;
}
