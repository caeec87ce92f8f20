//! Price store: cached, fallback-aware price acquisition.

use crate::domain::basket::DateRange;
use crate::domain::cache::PriceCache;
use crate::domain::error::RollfolioError;
use crate::domain::price_table::PriceTable;
use crate::ports::price_port::{AcquisitionOutcome, AcquisitionStrategy, PricePort};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Tries each strategy in order, moving on only after a retryable failure.
/// Successful tables are cached by `(symbols, range)`.
pub struct PriceStore {
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
    cache: PriceCache,
}

impl PriceStore {
    pub fn new(strategies: Vec<Box<dyn AcquisitionStrategy>>, cache: PriceCache) -> Self {
        Self { strategies, cache }
    }

    fn acquire(
        &self,
        symbols: &BTreeSet<String>,
        range: &DateRange,
    ) -> Result<PriceTable, RollfolioError> {
        let mut last_reason = String::from("no acquisition strategy configured");

        for (i, strategy) in self.strategies.iter().enumerate() {
            info!(
                strategy = strategy.name(),
                symbols = symbols.len(),
                start = %range.start,
                end = %range.end,
                "fetching prices"
            );
            match strategy.acquire(symbols, range) {
                AcquisitionOutcome::Success(table) => return Ok(table),
                AcquisitionOutcome::FatalFailure(reason) => {
                    return Err(RollfolioError::Acquisition {
                        reason: format!("{}: {}", strategy.name(), reason),
                    });
                }
                AcquisitionOutcome::RetryableFailure(reason) => {
                    if i + 1 < self.strategies.len() {
                        warn!(
                            strategy = strategy.name(),
                            "acquisition failed, falling back: {reason}"
                        );
                    }
                    last_reason = format!("{}: {}", strategy.name(), reason);
                }
            }
        }

        Err(RollfolioError::Acquisition {
            reason: last_reason,
        })
    }
}

impl PricePort for PriceStore {
    fn fetch(
        &self,
        symbols: &BTreeSet<String>,
        range: &DateRange,
    ) -> Result<PriceTable, RollfolioError> {
        let key = (symbols.clone(), *range);
        if let Some(table) = self.cache.get(&key) {
            debug!(symbols = symbols.len(), "price cache hit");
            return Ok(table.as_ref().clone());
        }

        let table = self.acquire(symbols, range)?.subset(symbols, range);
        if let Some(missing) = table.first_missing(symbols) {
            return Err(RollfolioError::data_unavailable(missing, range.start, range.end));
        }

        let table = self.cache.insert(key, table);
        info!(
            symbols = table.symbol_count(),
            rows = table.row_count(),
            cached = self.cache.len(),
            "prices ready"
        );
        Ok(table.as_ref().clone())
    }
}
