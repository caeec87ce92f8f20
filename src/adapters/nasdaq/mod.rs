//! NASDAQ Data Link acquisition strategies for the `SHARADAR/SEP` table.

pub mod bulk_export;
pub mod payload;
pub mod per_symbol;

pub use bulk_export::BulkExportStrategy;
pub use per_symbol::PerSymbolStrategy;

use crate::ports::http_port::{HttpError, HttpResponse};

pub const SEP_TABLE: &str = "datatables/SHARADAR/SEP";
pub const PRICE_COLUMNS: &str = "ticker,date,close";

pub(crate) fn table_url(base_url: &str, suffix: &str) -> String {
    format!("{}/{}{}", base_url.trim_end_matches('/'), SEP_TABLE, suffix)
}

/// A request that produced nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RequestFailure {
    /// The credential was rejected. Retrying cannot help.
    Fatal(String),
    Retryable(String),
}

impl RequestFailure {
    pub(crate) fn reason(&self) -> &str {
        match self {
            RequestFailure::Fatal(r) | RequestFailure::Retryable(r) => r,
        }
    }
}

/// Classifies a transport result: 2xx passes, 401/403 is fatal, anything
/// else is retryable. The bulk export downgrades fatal failures itself.
pub(crate) fn check(
    what: &str,
    result: Result<HttpResponse, HttpError>,
) -> Result<HttpResponse, RequestFailure> {
    match result {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) if response.is_auth_failure() => Err(RequestFailure::Fatal(format!(
            "{what}: credential rejected (HTTP {})",
            response.status
        ))),
        Ok(response) => Err(RequestFailure::Retryable(format!(
            "{what}: HTTP {}",
            response.status
        ))),
        Err(e) => Err(RequestFailure::Retryable(format!("{what}: {e}"))),
    }
}
