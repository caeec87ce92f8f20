//! FRED series observations adapter.

use crate::domain::basket::DateRange;
use crate::domain::benchmark::Observation;
use crate::domain::error::RollfolioError;
use crate::ports::benchmark_port::BenchmarkPort;
use crate::ports::http_port::HttpPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

pub struct FredAdapter {
    http: Arc<dyn HttpPort>,
    api_key: String,
    base_url: String,
}

impl FredAdapter {
    pub fn new(http: Arc<dyn HttpPort>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// "." marks a day without a published value.
    fn parse(body: &[u8]) -> Result<Vec<Observation>, RollfolioError> {
        let response: ObservationsResponse =
            serde_json::from_slice(body).map_err(|e| RollfolioError::Acquisition {
                reason: format!("unexpected FRED response: {e}"),
            })?;

        let mut observations = Vec::with_capacity(response.observations.len());
        for raw in response.observations {
            let Ok(date) = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d") else {
                debug!(date = %raw.date, "skipping observation with bad date");
                continue;
            };
            let value = match raw.value.trim() {
                "." | "" => None,
                v => v.parse::<f64>().ok(),
            };
            observations.push(Observation { date, value });
        }
        Ok(observations)
    }
}

impl BenchmarkPort for FredAdapter {
    fn fetch_observations(
        &self,
        series_id: &str,
        range: &DateRange,
    ) -> Result<Vec<Observation>, RollfolioError> {
        let url = format!("{}/series/observations", self.base_url.trim_end_matches('/'));
        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();
        let query = [
            ("series_id", series_id),
            ("observation_start", start.as_str()),
            ("observation_end", end.as_str()),
            ("file_type", "json"),
            ("api_key", self.api_key.as_str()),
        ];

        let response = self
            .http
            .get(&url, &query)
            .map_err(|e| RollfolioError::Acquisition {
                reason: e.to_string(),
            })?;
        if !response.is_success() {
            return Err(RollfolioError::Acquisition {
                reason: format!("FRED returned HTTP {} for {series_id}", response.status),
            });
        }
        Self::parse(&response.body)
    }
}
