//! Price acquisition port traits.

use crate::domain::basket::DateRange;
use crate::domain::error::RollfolioError;
use crate::domain::price_table::PriceTable;
use std::collections::BTreeSet;

/// Result of one acquisition attempt. Only `RetryableFailure` hands the
/// request to the next strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    Success(PriceTable),
    RetryableFailure(String),
    FatalFailure(String),
}

/// One way of turning `(symbols, range)` into closing prices.
pub trait AcquisitionStrategy {
    fn name(&self) -> &str;

    fn acquire(&self, symbols: &BTreeSet<String>, range: &DateRange) -> AcquisitionOutcome;
}

/// Resolves symbols to a complete price table.
pub trait PricePort {
    fn fetch(
        &self,
        symbols: &BTreeSet<String>,
        range: &DateRange,
    ) -> Result<PriceTable, RollfolioError>;
}
