//! Baskets, portfolio configurations and date ranges.
//!
//! A [`PortfolioConfig`] can only be built through [`PortfolioConfig::new`],
//! which enforces ordering and non-emptiness once at the load boundary. The
//! engine downstream relies on those invariants without re-checking them.

use crate::domain::error::RollfolioError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Inclusive calendar range used for price fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RollfolioError> {
        if start > end {
            return Err(RollfolioError::config(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Half-open `[start, end)` window a basket is held over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    tickers: Vec<String>,
    start_date: NaiveDate,
}

impl Basket {
    /// Builds a basket, rejecting empty, blank or duplicate tickers.
    /// Symbols are case-sensitive and kept in the order given.
    pub fn new(tickers: Vec<String>, start_date: NaiveDate) -> Result<Self, RollfolioError> {
        if tickers.is_empty() {
            return Err(RollfolioError::config(format!(
                "basket starting {start_date} has no tickers"
            )));
        }

        let mut seen = HashSet::new();
        let mut cleaned = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let trimmed = ticker.trim();
            if trimmed.is_empty() {
                return Err(RollfolioError::config(format!(
                    "basket starting {start_date} has a blank ticker"
                )));
            }
            if !seen.insert(trimmed.to_string()) {
                return Err(RollfolioError::config(format!(
                    "basket starting {start_date} lists {trimmed} more than once"
                )));
            }
            cleaned.push(trimmed.to_string());
        }

        Ok(Self {
            tickers: cleaned,
            start_date,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// "AAPL, MSFT, NVDA +2" style label used on transition markers.
    pub fn label(&self) -> String {
        let shown: Vec<&str> = self.tickers.iter().take(3).map(String::as_str).collect();
        let mut label = shown.join(", ");
        if self.tickers.len() > 3 {
            label.push_str(&format!(" +{}", self.tickers.len() - 3));
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioConfig {
    baskets: Vec<Basket>,
    end_date: NaiveDate,
}

impl PortfolioConfig {
    pub fn new(baskets: Vec<Basket>, end_date: NaiveDate) -> Result<Self, RollfolioError> {
        let Some(last) = baskets.last() else {
            return Err(RollfolioError::config("portfolio has no baskets"));
        };

        for (i, pair) in baskets.windows(2).enumerate() {
            if pair[1].start_date <= pair[0].start_date {
                return Err(RollfolioError::config(format!(
                    "basket {} starts {} which is not after basket {} start {}",
                    i + 2,
                    pair[1].start_date,
                    i + 1,
                    pair[0].start_date
                )));
            }
        }

        if end_date <= last.start_date {
            return Err(RollfolioError::config(format!(
                "end_date {} must be after the last basket start {}",
                end_date, last.start_date
            )));
        }

        Ok(Self { baskets, end_date })
    }

    pub fn baskets(&self) -> &[Basket] {
        &self.baskets
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn start_date(&self) -> NaiveDate {
        self.baskets[0].start_date
    }

    /// Holding window of basket `index`: up to the next basket's start, or
    /// the portfolio end date for the last basket.
    pub fn window(&self, index: usize) -> Window {
        let end = self
            .baskets
            .get(index + 1)
            .map(|b| b.start_date)
            .unwrap_or(self.end_date);
        Window {
            start: self.baskets[index].start_date,
            end,
        }
    }

    /// Union of every basket's tickers.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.baskets
            .iter()
            .flat_map(|b| b.tickers.iter().cloned())
            .collect()
    }

    /// Inclusive range that covers every basket window.
    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start_date(),
            end: self.end_date,
        }
    }
}

/// A portfolio configuration with a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledConfig {
    pub label: String,
    pub config: PortfolioConfig,
}

/// `growth_tilt` → `Growth Tilt`
pub fn label_from_stem(stem: &str) -> String {
    stem.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
