//! Delimited exports: value series, metrics and comparison ranking.

use crate::adapters::report_stem;
use crate::domain::analysis::PortfolioReport;
use crate::domain::error::RollfolioError;
use crate::domain::metrics::MetricsRecord;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

pub const COMPARISON_FILE: &str = "comparison.csv";

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_series(report: &PortfolioReport, path: &Path) -> Result<(), RollfolioError> {
        let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
        wtr.write_record(["date", "value", "basket_index"])
            .map_err(io::Error::from)?;
        for p in report.series.points() {
            wtr.write_record([
                p.date.format("%Y-%m-%d").to_string(),
                format!("{:.6}", p.value),
                p.basket_index.to_string(),
            ])
            .map_err(io::Error::from)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_metrics(metrics: &MetricsRecord, path: &Path) -> Result<(), RollfolioError> {
        let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
        wtr.write_record(["metric", "value"]).map_err(io::Error::from)?;
        for (name, value) in metrics.fields() {
            let value = if name == "days_held" {
                metrics.days_held.to_string()
            } else {
                cell(value)
            };
            wtr.write_record([name, value.as_str()])
                .map_err(io::Error::from)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// One row per portfolio, best first.
    fn write_ranking(reports: &[PortfolioReport], path: &Path) -> Result<(), RollfolioError> {
        let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
        let Some(first) = reports.first() else {
            wtr.flush()?;
            return Ok(());
        };

        let mut header = vec!["rank".to_string(), "portfolio".to_string()];
        header.extend(first.metrics.fields().iter().map(|(n, _)| n.to_string()));
        wtr.write_record(&header).map_err(io::Error::from)?;

        for (i, report) in reports.iter().enumerate() {
            let mut row = vec![(i + 1).to_string(), report.label.clone()];
            for (name, value) in report.metrics.fields() {
                row.push(if name == "days_held" {
                    report.metrics.days_held.to_string()
                } else {
                    cell(value)
                });
            }
            wtr.write_record(&row).map_err(io::Error::from)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &PortfolioReport, output_dir: &Path) -> Result<(), RollfolioError> {
        fs::create_dir_all(output_dir)?;
        let stem = report_stem(&report.label);
        let series_path = output_dir.join(format!("{stem}_series.csv"));
        let metrics_path = output_dir.join(format!("{stem}_metrics.csv"));

        Self::write_series(report, &series_path)?;
        Self::write_metrics(&report.metrics, &metrics_path)?;
        info!(
            series = %series_path.display(),
            metrics = %metrics_path.display(),
            "wrote CSV exports"
        );
        Ok(())
    }

    fn write_comparison(
        &self,
        reports: &[PortfolioReport],
        output_dir: &Path,
    ) -> Result<(), RollfolioError> {
        for report in reports {
            self.write(report, output_dir)?;
        }
        let path = output_dir.join(COMPARISON_FILE);
        Self::write_ranking(reports, &path)?;
        info!(path = %path.display(), "wrote comparison ranking");
        Ok(())
    }
}
