#![allow(dead_code)]

use chrono::NaiveDate;
use rollfolio::domain::basket::{Basket, DateRange, LabeledConfig, PortfolioConfig};
use rollfolio::domain::benchmark::Observation;
use rollfolio::domain::error::RollfolioError;
use rollfolio::domain::price_table::PriceTable;
use rollfolio::ports::benchmark_port::BenchmarkPort;
use rollfolio::ports::http_port::{HttpError, HttpPort, HttpResponse};
use rollfolio::ports::price_port::PricePort;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn symbols(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn basket(tickers: &[&str], start: NaiveDate) -> Basket {
    Basket::new(tickers.iter().map(|t| t.to_string()).collect(), start).unwrap()
}

pub fn portfolio(baskets: Vec<(Vec<&str>, NaiveDate)>, end: NaiveDate) -> PortfolioConfig {
    PortfolioConfig::new(
        baskets.into_iter().map(|(t, d)| basket(&t, d)).collect(),
        end,
    )
    .unwrap()
}

pub fn labeled(label: &str, config: PortfolioConfig) -> LabeledConfig {
    LabeledConfig {
        label: label.to_string(),
        config,
    }
}

/// `(symbol, date, close)` rows as a table.
pub fn table(rows: &[(&str, NaiveDate, f64)]) -> PriceTable {
    let mut t = PriceTable::new();
    for (s, d, c) in rows {
        assert!(t.insert(s, *d, *c));
    }
    t
}

/// Two baskets: `[A, B]` from 2024-01-01 and `[C]` from 2024-06-01, ending
/// 2024-12-31. A and B gain 10%, C gains 20%, so the portfolio ends at 132.
pub fn rollover_scenario() -> (PortfolioConfig, PriceTable) {
    let config = portfolio(
        vec![
            (vec!["A", "B"], date(2024, 1, 1)),
            (vec!["C"], date(2024, 6, 1)),
        ],
        date(2024, 12, 31),
    );
    let prices = table(&[
        ("A", date(2024, 1, 2), 50.0),
        ("A", date(2024, 3, 1), 52.0),
        ("A", date(2024, 5, 31), 55.0),
        ("B", date(2024, 1, 2), 200.0),
        ("B", date(2024, 3, 1), 210.0),
        ("B", date(2024, 5, 31), 220.0),
        ("C", date(2024, 6, 3), 10.0),
        ("C", date(2024, 9, 2), 11.0),
        ("C", date(2024, 12, 30), 12.0),
    ]);
    (config, prices)
}

/// Serves a fixed table and counts fetches.
pub struct MockPricePort {
    pub table: PriceTable,
    pub calls: Cell<usize>,
    pub requests: RefCell<Vec<(BTreeSet<String>, DateRange)>>,
}

impl MockPricePort {
    pub fn new(table: PriceTable) -> Self {
        Self {
            table,
            calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl PricePort for MockPricePort {
    fn fetch(
        &self,
        symbols: &BTreeSet<String>,
        range: &DateRange,
    ) -> Result<PriceTable, RollfolioError> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push((symbols.clone(), *range));
        let subset = self.table.subset(symbols, range);
        if let Some(missing) = subset.first_missing(symbols) {
            return Err(RollfolioError::data_unavailable(missing, range.start, range.end));
        }
        Ok(subset)
    }
}

pub struct MockBenchmarkPort {
    pub observations: Result<Vec<Observation>, String>,
}

impl BenchmarkPort for MockBenchmarkPort {
    fn fetch_observations(
        &self,
        _series_id: &str,
        _range: &DateRange,
    ) -> Result<Vec<Observation>, RollfolioError> {
        self.observations
            .clone()
            .map_err(|reason| RollfolioError::Acquisition { reason })
    }
}

/// Replays canned HTTP responses in order.
#[derive(Default)]
pub struct FakeHttp {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    pub urls: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn then(self, response: Result<HttpResponse, HttpError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn then_ok(self, content_type: &str, body: &[u8]) -> Self {
        self.then(Ok(HttpResponse {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        }))
    }

    pub fn then_timeout(self, url: &str) -> Self {
        self.then(Err(HttpError::Timeout {
            url: url.to_string(),
        }))
    }

    pub fn url_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl HttpPort for FakeHttp {
    fn get(&self, url: &str, _query: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(HttpError::Transport {
                    url: url.to_string(),
                    reason: "unscripted request".to_string(),
                })
            })
    }
}
