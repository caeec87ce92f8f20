//! YAML portfolio documents.
//!
//! ```yaml
//! baskets:
//!   - tickers: [AAPL, MSFT]
//!     start_date: "2024-01-01"
//! end_date: "2024-12-31"
//! ```

use crate::domain::basket::{Basket, LabeledConfig, PortfolioConfig, label_from_stem};
use crate::domain::error::RollfolioError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct PortfolioDocument {
    baskets: Vec<BasketDocument>,
    end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
struct BasketDocument {
    tickers: Vec<String>,
    start_date: NaiveDate,
}

/// Parses and validates a document; `source` names it in errors.
pub fn parse_portfolio(text: &str, source: &str) -> Result<PortfolioConfig, RollfolioError> {
    let doc: PortfolioDocument =
        serde_yaml::from_str(text).map_err(|e| RollfolioError::ConfigParse {
            file: source.to_string(),
            reason: e.to_string(),
        })?;

    let baskets = doc
        .baskets
        .into_iter()
        .map(|b| Basket::new(b.tickers, b.start_date))
        .collect::<Result<Vec<_>, _>>()?;
    PortfolioConfig::new(baskets, doc.end_date)
}

/// Loads a portfolio, labelling it from the file stem.
pub fn load_portfolio(path: &Path) -> Result<LabeledConfig, RollfolioError> {
    let text = fs::read_to_string(path).map_err(|e| RollfolioError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let config = parse_portfolio(&text, &path.display().to_string())?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "portfolio".to_string());
    Ok(LabeledConfig {
        label: label_from_stem(&stem),
        config,
    })
}

pub fn render_portfolio(config: &PortfolioConfig) -> Result<String, RollfolioError> {
    let doc = PortfolioDocument {
        baskets: config
            .baskets()
            .iter()
            .map(|b| BasketDocument {
                tickers: b.tickers().to_vec(),
                start_date: b.start_date(),
            })
            .collect(),
        end_date: config.end_date(),
    };
    serde_yaml::to_string(&doc).map_err(|e| RollfolioError::config(e.to_string()))
}

pub fn save_portfolio(path: &Path, config: &PortfolioConfig) -> Result<(), RollfolioError> {
    fs::write(path, render_portfolio(config)?)?;
    Ok(())
}

/// Two-basket example written by `init`.
pub fn sample_portfolio() -> Result<PortfolioConfig, RollfolioError> {
    let date = |y, m, d| {
        NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| RollfolioError::config(format!("invalid date {y}-{m}-{d}")))
    };
    PortfolioConfig::new(
        vec![
            Basket::new(
                vec!["AAPL".into(), "MSFT".into(), "NVDA".into()],
                date(2024, 1, 2)?,
            )?,
            Basket::new(
                vec!["AMZN".into(), "GOOGL".into(), "META".into(), "NVDA".into()],
                date(2024, 7, 1)?,
            )?,
        ],
        date(2024, 12, 31)?,
    )
}
