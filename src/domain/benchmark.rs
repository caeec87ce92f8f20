//! Market-index benchmark: gap filling and normalization.

use crate::domain::basket::DateRange;
use crate::domain::error::RollfolioError;
use crate::domain::value_series::{BASE_VALUE, ValueSeries};
use crate::ports::benchmark_port::BenchmarkPort;
use chrono::NaiveDate;
use tracing::{info, warn};

/// One raw index observation; `None` for holidays and unreported days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Forward-fills gaps, back-fills any leading gap, then drops dates that are
/// still empty. Input is sorted by date first.
pub fn gap_fill(observations: &[Observation]) -> Vec<(NaiveDate, f64)> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.date);

    let mut filled: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(sorted.len());
    let mut carry: Option<f64> = None;
    for obs in &sorted {
        let value = obs.value.filter(|v| v.is_finite());
        if value.is_some() {
            carry = value;
        }
        filled.push((obs.date, carry));
    }

    if let Some(first_known) = filled.iter().find_map(|(_, v)| *v) {
        for slot in filled.iter_mut() {
            if slot.1.is_some() {
                break;
            }
            slot.1 = Some(first_known);
        }
    }

    filled
        .into_iter()
        .filter_map(|(d, v)| v.map(|v| (d, v)))
        .collect()
}

/// Restricts to `range`, gap-fills and rescales so the first value is 100.
pub fn normalize(
    observations: &[Observation],
    range: &DateRange,
    series_id: &str,
) -> Result<ValueSeries, RollfolioError> {
    let in_range: Vec<Observation> = observations
        .iter()
        .filter(|o| range.contains(o.date))
        .copied()
        .collect();
    let filled = gap_fill(&in_range);

    let Some(&(_, initial)) = filled.first() else {
        return Err(RollfolioError::data_unavailable(series_id, range.start, range.end));
    };
    if initial == 0.0 {
        return Err(RollfolioError::data_unavailable(series_id, range.start, range.end));
    }

    let mut series = ValueSeries::new();
    for (date, value) in &filled {
        series.push(*date, value / initial * BASE_VALUE, 0);
    }
    Ok(series)
}

/// Fetches and normalizes the benchmark index.
pub struct BenchmarkSource {
    port: Box<dyn BenchmarkPort>,
    series_id: String,
}

impl BenchmarkSource {
    pub fn new(port: Box<dyn BenchmarkPort>, series_id: impl Into<String>) -> Self {
        Self {
            port,
            series_id: series_id.into(),
        }
    }

    pub fn fetch(&self, range: &DateRange) -> Result<ValueSeries, RollfolioError> {
        let observations = self.port.fetch_observations(&self.series_id, range)?;
        let series = normalize(&observations, range, &self.series_id)?;
        info!(
            series = %self.series_id,
            days = series.len(),
            "benchmark loaded"
        );
        Ok(series)
    }

    /// Like [`fetch`](Self::fetch), but a failure only disables the
    /// benchmark for this run.
    pub fn fetch_optional(&self, range: &DateRange) -> Option<ValueSeries> {
        match self.fetch(range) {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(series = %self.series_id, "benchmark skipped: {e}");
                None
            }
        }
    }
}
