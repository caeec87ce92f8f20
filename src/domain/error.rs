//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for rollfolio.
#[derive(Debug, thiserror::Error)]
pub enum RollfolioError {
    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("no data for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("price acquisition failed: {reason}")]
    Acquisition { reason: String },

    #[error("compute error in basket {basket_index}: {reason}")]
    Compute { basket_index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RollfolioError {
    pub fn config(reason: impl Into<String>) -> Self {
        RollfolioError::Config {
            reason: reason.into(),
        }
    }

    pub fn data_unavailable(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        RollfolioError::DataUnavailable {
            symbol: symbol.into(),
            start,
            end,
        }
    }
}

impl From<&RollfolioError> for std::process::ExitCode {
    fn from(err: &RollfolioError) -> Self {
        let code: u8 = match err {
            RollfolioError::Io(_) => 1,
            RollfolioError::Config { .. }
            | RollfolioError::ConfigParse { .. }
            | RollfolioError::ConfigMissing { .. } => 2,
            RollfolioError::DataUnavailable { .. } => 3,
            RollfolioError::Acquisition { .. } => 4,
            RollfolioError::Compute { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
