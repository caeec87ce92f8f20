//! Local CSV price directory: one `<SYMBOL>.csv` file of `date,close` rows
//! per symbol.

use crate::domain::basket::DateRange;
use crate::domain::error::RollfolioError;
use crate::domain::price_table::PriceTable;
use crate::ports::price_port::{AcquisitionOutcome, AcquisitionStrategy};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvDirStrategy {
    base_path: PathBuf,
}

impl CsvDirStrategy {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Reads one symbol into `table`. `Ok(false)` when the file does not exist.
    fn load_symbol(
        &self,
        symbol: &str,
        range: &DateRange,
        table: &mut PriceTable,
    ) -> Result<bool, RollfolioError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(RollfolioError::Acquisition {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| RollfolioError::Acquisition {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| RollfolioError::Acquisition {
                    reason: format!("{}: missing {} column", path.display(), name),
                })
        };
        let date_idx = column("date")?;
        let close_idx = column("close")?;

        for result in rdr.records() {
            let record = result.map_err(|e| RollfolioError::Acquisition {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                RollfolioError::Acquisition {
                    reason: format!("{}: invalid date '{}': {}", path.display(), date_str, e),
                }
            })?;
            if !range.contains(date) {
                continue;
            }

            let close: f64 = record
                .get(close_idx)
                .unwrap_or_default()
                .parse()
                .map_err(|e| RollfolioError::Acquisition {
                    reason: format!("{}: invalid close value: {}", path.display(), e),
                })?;
            if !table.insert(symbol, date, close) {
                warn!(symbol, %date, close, "ignoring non-positive close");
            }
        }
        Ok(true)
    }
}

impl AcquisitionStrategy for CsvDirStrategy {
    fn name(&self) -> &str {
        "csv-dir"
    }

    fn acquire(&self, symbols: &BTreeSet<String>, range: &DateRange) -> AcquisitionOutcome {
        let mut table = PriceTable::new();
        for symbol in symbols {
            match self.load_symbol(symbol, range, &mut table) {
                Ok(true) => {}
                Ok(false) => debug!(symbol = %symbol, dir = %self.base_path.display(), "no price file"),
                Err(e) => return AcquisitionOutcome::FatalFailure(e.to_string()),
            }
        }
        AcquisitionOutcome::Success(table)
    }
}
