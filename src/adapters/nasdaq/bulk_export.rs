//! Bulk export strategy: one market-wide export job, polled until a download
//! link appears, then downloaded and filtered locally.

use super::payload::{self, ParseStats, TextEncoding};
use super::{PRICE_COLUMNS, RequestFailure, check, table_url};
use crate::domain::basket::DateRange;
use crate::domain::poll::{PollPolicy, PollResult};
use crate::domain::price_table::PriceTable;
use crate::ports::clock_port::Clock;
use crate::ports::http_port::HttpPort;
use crate::ports::price_port::{AcquisitionOutcome, AcquisitionStrategy};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ExportEnvelope {
    datatable_bulk_download: Option<BulkJob>,
}

#[derive(Debug, Deserialize)]
struct BulkJob {
    link: Option<String>,
    /// URL to poll while the export is being built.
    status: Option<String>,
    file: Option<BulkFile>,
}

#[derive(Debug, Deserialize)]
struct BulkFile {
    link: Option<String>,
}

impl BulkJob {
    fn download_link(&self) -> Option<String> {
        self.link
            .clone()
            .or_else(|| self.file.as_ref().and_then(|f| f.link.clone()))
            .filter(|l| !l.is_empty())
    }
}

fn parse_job(body: &[u8]) -> Result<BulkJob, RequestFailure> {
    let envelope: ExportEnvelope = serde_json::from_slice(body)
        .map_err(|e| RequestFailure::Retryable(format!("export response is not valid JSON: {e}")))?;
    envelope.datatable_bulk_download.ok_or_else(|| {
        RequestFailure::Retryable("export response lacks datatable_bulk_download".into())
    })
}

pub struct BulkExportStrategy {
    http: Arc<dyn HttpPort>,
    clock: Arc<dyn Clock>,
    api_key: String,
    base_url: String,
    poll: PollPolicy,
}

impl BulkExportStrategy {
    pub fn new(
        http: Arc<dyn HttpPort>,
        clock: Arc<dyn Clock>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            http,
            clock,
            api_key: api_key.into(),
            base_url: base_url.into(),
            poll,
        }
    }

    fn export_job(&self, range: &DateRange) -> Result<BulkJob, RequestFailure> {
        let url = table_url(&self.base_url, "");
        let gte = range.start.format("%Y-%m-%d").to_string();
        let lte = range.end.format("%Y-%m-%d").to_string();
        let query = [
            ("qopts.export", "true"),
            ("qopts.columns", PRICE_COLUMNS),
            ("date.gte", gte.as_str()),
            ("date.lte", lte.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        let response = check("export request", self.http.get(&url, &query))?;
        parse_job(&response.body)
    }

    fn download_link(&self, range: &DateRange) -> Result<String, RequestFailure> {
        let job = self.export_job(range)?;
        if let Some(link) = job.download_link() {
            return Ok(link);
        }

        info!(
            interval_secs = self.poll.interval.as_secs(),
            timeout_secs = self.poll.timeout.as_secs(),
            "bulk export queued, polling for download link"
        );
        let status_url = job.status;
        let result: PollResult<String, RequestFailure> =
            self.poll.run(self.clock.as_ref(), |attempt| {
                let job = match &status_url {
                    Some(url) => {
                        let response = check("export status", self.http.get(url, &[]))?;
                        parse_job(&response.body)?
                    }
                    None => self.export_job(range)?,
                };
                let link = job.download_link();
                if link.is_none() {
                    debug!(attempt, "bulk export not ready");
                }
                Ok(link)
            });

        match result {
            PollResult::Ready(link) => Ok(link),
            PollResult::Failed(failure) => Err(failure),
            PollResult::TimedOut { attempts, waited } => Err(RequestFailure::Retryable(format!(
                "export not ready after {}s ({attempts} polls)",
                waited.as_secs()
            ))),
        }
    }

    fn download(
        &self,
        link: &str,
        symbols: &BTreeSet<String>,
        range: &DateRange,
    ) -> Result<PriceTable, RequestFailure> {
        let response = check("export download", self.http.get(link, &[]))?;
        let format =
            payload::detect_format(response.content_type.as_deref(), link, &response.body);
        let documents = payload::extract_documents(format, &response.body)
            .map_err(|e| RequestFailure::Retryable(format!("malformed export payload: {e}")))?;

        let mut table = PriceTable::new();
        let mut totals = ParseStats::default();
        for document in &documents {
            let (text, encoding) = payload::decode_text(document);
            if encoding == TextEncoding::Latin1 {
                warn!("export payload is not valid UTF-8, decoded as Latin-1");
            }
            let stats = payload::parse_rows(&text, symbols, range, &mut table)
                .map_err(|e| RequestFailure::Retryable(format!("malformed export payload: {e}")))?;
            totals.rows += stats.rows;
            totals.kept += stats.kept;
            totals.skipped += stats.skipped;
        }

        info!(
            format = ?format,
            members = documents.len(),
            rows = totals.rows,
            kept = totals.kept,
            skipped = totals.skipped,
            "bulk export parsed"
        );
        if table.is_empty() {
            warn!("bulk export held none of the requested symbols");
        }
        Ok(table)
    }
}

impl AcquisitionStrategy for BulkExportStrategy {
    fn name(&self) -> &str {
        "bulk-export"
    }

    fn acquire(&self, symbols: &BTreeSet<String>, range: &DateRange) -> AcquisitionOutcome {
        let result = self
            .download_link(range)
            .and_then(|link| self.download(&link, symbols, range));
        match result {
            Ok(table) => AcquisitionOutcome::Success(table),
            // Any bulk failure, a rejected key included, leaves the fallback to try.
            Err(failure) => AcquisitionOutcome::RetryableFailure(failure.reason().to_string()),
        }
    }
}
