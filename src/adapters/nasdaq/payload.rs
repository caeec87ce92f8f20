//! Bulk export payload handling: container detection, decompression, text
//! decoding and CSV row parsing.

use crate::domain::basket::DateRange;
use crate::domain::price_table::PriceTable;
use chrono::NaiveDate;
use flate2::read::MultiGzDecoder;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: &[u8] = b"PK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Zip,
    Gzip,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid zip archive: {0}")]
    Zip(String),

    #[error("invalid gzip stream: {0}")]
    Gzip(String),

    #[error("archive contains no CSV member")]
    NoCsvMember,

    #[error("CSV header lacks a '{0}' column")]
    MissingColumn(&'static str),

    #[error("CSV parse error: {0}")]
    Csv(String),
}

/// Content type, then link suffix, then magic bytes decide the container.
pub fn detect_format(content_type: Option<&str>, link: &str, body: &[u8]) -> PayloadFormat {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    let path = link.split('?').next().unwrap_or(link);
    if content_type.contains("zip") && !content_type.contains("gzip")
        || path.ends_with(".zip")
        || body.starts_with(ZIP_MAGIC)
    {
        PayloadFormat::Zip
    } else if body.starts_with(&GZIP_MAGIC) {
        PayloadFormat::Gzip
    } else {
        PayloadFormat::Plain
    }
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let mut out = Vec::new();
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| PayloadError::Gzip(e.to_string()))?;
    Ok(out)
}

/// Raw CSV documents contained in the payload. Every `.csv` or `.csv.gz`
/// member of a zip archive is returned, gzip members inflated.
pub fn extract_documents(format: PayloadFormat, body: &[u8]) -> Result<Vec<Vec<u8>>, PayloadError> {
    match format {
        PayloadFormat::Plain => Ok(vec![body.to_vec()]),
        PayloadFormat::Gzip => Ok(vec![gunzip(body)?]),
        PayloadFormat::Zip => {
            let mut archive = zip::ZipArchive::new(Cursor::new(body))
                .map_err(|e| PayloadError::Zip(e.to_string()))?;
            let mut documents = Vec::new();
            for i in 0..archive.len() {
                let mut member = archive
                    .by_index(i)
                    .map_err(|e| PayloadError::Zip(e.to_string()))?;
                let name = member.name().to_ascii_lowercase();
                if !(name.ends_with(".csv") || name.ends_with(".csv.gz")) {
                    continue;
                }
                let mut bytes = Vec::new();
                member
                    .read_to_end(&mut bytes)
                    .map_err(|e| PayloadError::Zip(e.to_string()))?;
                if bytes.starts_with(&GZIP_MAGIC) {
                    bytes = gunzip(&bytes)?;
                }
                documents.push(bytes);
            }
            if documents.is_empty() {
                return Err(PayloadError::NoCsvMember);
            }
            Ok(documents)
        }
    }
}

/// Strict UTF-8, falling back to Latin-1, which maps every byte.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (
            bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Latin1,
        ),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub rows: usize,
    pub kept: usize,
    pub skipped: usize,
}

/// Parses `ticker,date,close` rows (columns located by header name) into
/// `table`, keeping only `symbols` within `range`. Rows with an unreadable
/// date or price, or a non-positive price, are skipped.
pub fn parse_rows(
    text: &str,
    symbols: &BTreeSet<String>,
    range: &DateRange,
    table: &mut PriceTable,
) -> Result<ParseStats, PayloadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| PayloadError::Csv(e.to_string()))?
        .clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or(PayloadError::MissingColumn(name))
    };
    let ticker_idx = column("ticker")?;
    let date_idx = column("date")?;
    let close_idx = column("close")?;

    let mut stats = ParseStats::default();
    for result in rdr.records() {
        let record = result.map_err(|e| PayloadError::Csv(e.to_string()))?;
        stats.rows += 1;

        let Some(ticker) = record.get(ticker_idx) else {
            stats.skipped += 1;
            continue;
        };
        if !symbols.contains(ticker) {
            continue;
        }

        let date = record
            .get(date_idx)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let close = record.get(close_idx).and_then(|c| c.parse::<f64>().ok());
        match (date, close) {
            (Some(date), Some(close)) if range.contains(date) => {
                if table.insert(ticker, date, close) {
                    stats.kept += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            (Some(_), Some(_)) => {}
            _ => stats.skipped += 1,
        }
    }
    Ok(stats)
}
