//! Runtime settings and API credentials.
//!
//! Credentials are resolved once at startup and passed to the adapters'
//! constructors; nothing else reads the environment.

use crate::domain::error::RollfolioError;
use crate::domain::poll::PollPolicy;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;
use tracing::warn;

pub const PRICE_KEY_VAR: &str = "NASDAQ_DATA_LINK_API_KEY";
pub const BENCHMARK_KEY_VAR: &str = "FRED_API_KEY";

pub const DEFAULT_NASDAQ_URL: &str = "https://data.nasdaq.com/api/v3";
pub const DEFAULT_FRED_URL: &str = "https://api.stlouisfed.org/fred";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub price_key: String,
    pub benchmark_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("price_key", &"<redacted>")
            .field("benchmark_key", &self.benchmark_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Resolves both keys, preferring `lookup` (the environment) over the
    /// `[credentials]` section. A missing price key is fatal; a missing
    /// benchmark key only disables the benchmark.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        config: &dyn ConfigPort,
    ) -> Result<Self, RollfolioError> {
        let find = |var: &str, key: &str| {
            lookup(var)
                .or_else(|| config.get_string("credentials", key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let price_key = find(PRICE_KEY_VAR, "price_api_key").ok_or_else(|| {
            RollfolioError::ConfigMissing {
                section: "credentials".into(),
                key: format!("price_api_key (or {PRICE_KEY_VAR})"),
            }
        })?;

        let benchmark_key = find(BENCHMARK_KEY_VAR, "benchmark_api_key");
        if benchmark_key.is_none() {
            warn!("{BENCHMARK_KEY_VAR} not set; benchmark comparison will be skipped");
        }

        Ok(Self {
            price_key,
            benchmark_key,
        })
    }

    pub fn from_env(config: &dyn ConfigPort) -> Result<Self, RollfolioError> {
        Self::resolve(|var| std::env::var(var).ok(), config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub nasdaq_url: String,
    pub fred_url: String,
    pub benchmark_series: String,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
    pub symbol_delay: Duration,
    pub cache_ttl: Duration,
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nasdaq_url: DEFAULT_NASDAQ_URL.to_string(),
            fred_url: DEFAULT_FRED_URL.to_string(),
            benchmark_series: "SP500".to_string(),
            poll: PollPolicy::default(),
            request_timeout: Duration::from_secs(30),
            symbol_delay: Duration::from_millis(200),
            cache_ttl: Duration::from_secs(3600),
            output_dir: "charts".to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RollfolioError> {
        let d = Settings::default();
        let settings = Settings {
            nasdaq_url: config.get_string("nasdaq", "base_url").unwrap_or(d.nasdaq_url),
            fred_url: config.get_string("fred", "base_url").unwrap_or(d.fred_url),
            benchmark_series: config
                .get_string("fred", "series_id")
                .unwrap_or(d.benchmark_series),
            poll: PollPolicy {
                interval: config.get_secs("nasdaq", "poll_interval_secs", d.poll.interval),
                timeout: config.get_secs("nasdaq", "export_timeout_secs", d.poll.timeout),
            },
            request_timeout: config.get_secs("nasdaq", "request_timeout_secs", d.request_timeout),
            symbol_delay: config.get_millis("nasdaq", "symbol_delay_ms", d.symbol_delay),
            cache_ttl: config.get_secs("cache", "ttl_secs", d.cache_ttl),
            output_dir: config.get_string("output", "dir").unwrap_or(d.output_dir),
        };

        if settings.poll.interval.is_zero() {
            return Err(RollfolioError::config(
                "[nasdaq] poll_interval_secs must be positive",
            ));
        }
        if settings.poll.timeout < settings.poll.interval {
            return Err(RollfolioError::config(
                "[nasdaq] export_timeout_secs must be at least poll_interval_secs",
            ));
        }
        Ok(settings)
    }
}
