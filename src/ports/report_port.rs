//! Report output port trait.

use crate::domain::analysis::PortfolioReport;
use crate::domain::error::RollfolioError;
use std::path::Path;

/// Port for exporting analysis results.
pub trait ReportPort {
    fn write(&self, report: &PortfolioReport, output_dir: &Path) -> Result<(), RollfolioError>;

    /// Default implementation: writes each ranked report on its own.
    fn write_comparison(
        &self,
        reports: &[PortfolioReport],
        output_dir: &Path,
    ) -> Result<(), RollfolioError> {
        for report in reports {
            self.write(report, output_dir)?;
        }
        Ok(())
    }
}
