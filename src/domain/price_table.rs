//! Closing-price table keyed by symbol.

use crate::domain::basket::DateRange;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Closing prices per symbol, ordered by date.
///
/// Ingestion drops non-positive and non-finite prices, and a second price for
/// an existing `(symbol, date)` replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a close. Returns `false` if the price was rejected.
    pub fn insert(&mut self, symbol: &str, date: NaiveDate, close: f64) -> bool {
        if !close.is_finite() || close <= 0.0 {
            return false;
        }
        self.series
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
        true
    }

    pub fn get(&self, symbol: &str, date: NaiveDate) -> Option<f64> {
        self.series.get(symbol).and_then(|s| s.get(&date)).copied()
    }

    /// Date-ordered closes for `symbol`, empty if unknown.
    pub fn prices(&self, symbol: &str) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.series
            .get(symbol)
            .into_iter()
            .flat_map(|s| s.iter().map(|(&d, &p)| (d, p)))
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.series.get(symbol).is_some_and(|s| !s.is_empty())
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn row_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Copies the rows for `symbols` within `range` into a new table.
    pub fn subset(&self, symbols: &BTreeSet<String>, range: &DateRange) -> PriceTable {
        let series = symbols
            .iter()
            .filter_map(|sym| {
                let rows: BTreeMap<NaiveDate, f64> = self
                    .series
                    .get(sym)?
                    .range(range.start..=range.end)
                    .map(|(&d, &p)| (d, p))
                    .collect();
                (!rows.is_empty()).then(|| (sym.clone(), rows))
            })
            .collect();
        PriceTable { series }
    }

    /// First requested symbol with no rows, if any.
    pub fn first_missing<'a>(&self, symbols: &'a BTreeSet<String>) -> Option<&'a str> {
        symbols
            .iter()
            .find(|s| !self.contains_symbol(s))
            .map(String::as_str)
    }
}
