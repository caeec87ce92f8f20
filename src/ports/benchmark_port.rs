//! Benchmark observation port trait.

use crate::domain::basket::DateRange;
use crate::domain::benchmark::Observation;
use crate::domain::error::RollfolioError;

/// Raw, possibly gappy observations of an index series.
pub trait BenchmarkPort {
    fn fetch_observations(
        &self,
        series_id: &str,
        range: &DateRange,
    ) -> Result<Vec<Observation>, RollfolioError>;
}
