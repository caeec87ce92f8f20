//! Chart-ready JSON export.

use crate::adapters::report_stem;
use crate::domain::analysis::PortfolioReport;
use crate::domain::error::RollfolioError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct JsonChartAdapter;

impl ReportPort for JsonChartAdapter {
    fn write(&self, report: &PortfolioReport, output_dir: &Path) -> Result<(), RollfolioError> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}_chart.json", report_stem(&report.label)));
        let json = serde_json::to_string_pretty(&report.chart())
            .map_err(|e| RollfolioError::Io(e.into()))?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "wrote chart data");
        Ok(())
    }
}
