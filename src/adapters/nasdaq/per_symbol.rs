//! Per-symbol strategy: one paginated table query per ticker.

use super::{PRICE_COLUMNS, RequestFailure, check, table_url};
use crate::domain::basket::DateRange;
use crate::domain::price_table::PriceTable;
use crate::ports::clock_port::Clock;
use crate::ports::http_port::HttpPort;
use crate::ports::price_port::{AcquisitionOutcome, AcquisitionStrategy};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct TablePage {
    datatable: Datatable,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct Datatable {
    data: Vec<Vec<serde_json::Value>>,
    columns: Vec<Column>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    next_cursor_id: Option<String>,
}

impl Datatable {
    fn column(&self, name: &str) -> Result<usize, RequestFailure> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RequestFailure::Retryable(format!("table response lacks '{name}'")))
    }

    /// Appends this page's rows to `table`, returning how many were kept.
    fn collect_into(&self, symbol: &str, table: &mut PriceTable) -> Result<usize, RequestFailure> {
        let date_idx = self.column("date")?;
        let close_idx = self.column("close")?;
        let mut kept = 0;
        for row in &self.data {
            let date = row
                .get(date_idx)
                .and_then(|v| v.as_str())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let close = row.get(close_idx).and_then(|v| match v {
                serde_json::Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            });
            if let (Some(date), Some(close)) = (date, close) {
                if table.insert(symbol, date, close) {
                    kept += 1;
                }
            }
        }
        Ok(kept)
    }
}

pub struct PerSymbolStrategy {
    http: Arc<dyn HttpPort>,
    clock: Arc<dyn Clock>,
    api_key: String,
    base_url: String,
    delay: Duration,
}

impl PerSymbolStrategy {
    pub fn new(
        http: Arc<dyn HttpPort>,
        clock: Arc<dyn Clock>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            http,
            clock,
            api_key: api_key.into(),
            base_url: base_url.into(),
            delay,
        }
    }

    fn fetch_symbol(
        &self,
        symbol: &str,
        range: &DateRange,
        table: &mut PriceTable,
    ) -> Result<usize, RequestFailure> {
        let url = table_url(&self.base_url, ".json");
        let gte = range.start.format("%Y-%m-%d").to_string();
        let lte = range.end.format("%Y-%m-%d").to_string();
        let mut cursor: Option<String> = None;
        let mut kept = 0;

        loop {
            let response = {
                let mut query = vec![
                    ("ticker", symbol),
                    ("date.gte", gte.as_str()),
                    ("date.lte", lte.as_str()),
                    ("qopts.columns", PRICE_COLUMNS),
                    ("api_key", self.api_key.as_str()),
                ];
                if let Some(c) = cursor.as_deref() {
                    query.push(("qopts.cursor_id", c));
                }
                check(symbol, self.http.get(&url, &query))?
            };
            let page: TablePage = serde_json::from_slice(&response.body).map_err(|e| {
                RequestFailure::Retryable(format!("{symbol}: unexpected table response: {e}"))
            })?;
            kept += page.datatable.collect_into(symbol, table)?;

            match page.meta.next_cursor_id {
                Some(next) if Some(&next) != cursor.as_ref() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(kept)
    }
}

impl AcquisitionStrategy for PerSymbolStrategy {
    fn name(&self) -> &str {
        "per-symbol"
    }

    /// Queries every symbol, then fails naming each symbol whose request
    /// failed. A symbol that answered with no rows is left for the store to
    /// report as missing data.
    fn acquire(&self, symbols: &BTreeSet<String>, range: &DateRange) -> AcquisitionOutcome {
        let mut table = PriceTable::new();
        let mut failed: Vec<&str> = Vec::new();

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                self.clock.sleep(self.delay);
            }
            match self.fetch_symbol(symbol, range, &mut table) {
                Ok(rows) => debug!(symbol = %symbol, rows, "symbol fetched"),
                Err(RequestFailure::Fatal(reason)) => {
                    return AcquisitionOutcome::FatalFailure(reason);
                }
                Err(failure) => {
                    warn!(symbol = %symbol, "symbol request failed: {}", failure.reason());
                    failed.push(symbol.as_str());
                }
            }
        }

        if !failed.is_empty() {
            return AcquisitionOutcome::FatalFailure(format!(
                "{} of {} symbol requests failed: {}",
                failed.len(),
                symbols.len(),
                failed.join(", ")
            ));
        }

        info!(
            fetched = symbols.len(),
            rows = table.row_count(),
            "per-symbol fetch complete"
        );
        AcquisitionOutcome::Success(table)
    }
}
