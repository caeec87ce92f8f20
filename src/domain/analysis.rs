//! Single-portfolio analysis and multi-portfolio comparison.

use crate::domain::basket::{DateRange, LabeledConfig, PortfolioConfig};
use crate::domain::benchmark::BenchmarkSource;
use crate::domain::error::RollfolioError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::price_table::PriceTable;
use crate::domain::rollover;
use crate::domain::value_series::{
    BASE_VALUE, ChartData, TransitionMarker, ValuePoint, ValueSeries, transition_markers,
};
use crate::ports::price_port::PricePort;
use std::collections::BTreeSet;
use tracing::{error, info};

pub const MIN_COMPARISON: usize = 2;
pub const MAX_COMPARISON: usize = 5;

/// Everything the presentation layer needs for one portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReport {
    pub label: String,
    pub series: ValueSeries,
    pub metrics: MetricsRecord,
    /// Benchmark restricted to this portfolio's dates.
    pub benchmark: Option<ValueSeries>,
    pub markers: Vec<TransitionMarker>,
}

impl PortfolioReport {
    pub fn chart(&self) -> ChartData {
        ChartData::build(
            &self.label,
            &self.series,
            self.benchmark.as_ref(),
            self.markers.clone(),
        )
    }
}

/// Runs the pipeline against a price port and an optional benchmark.
pub struct Analyzer<'a> {
    prices: &'a dyn PricePort,
    benchmark: Option<&'a BenchmarkSource>,
}

impl<'a> Analyzer<'a> {
    pub fn new(prices: &'a dyn PricePort, benchmark: Option<&'a BenchmarkSource>) -> Self {
        Self { prices, benchmark }
    }

    pub fn analyze(&self, labeled: &LabeledConfig) -> Result<PortfolioReport, RollfolioError> {
        let config = &labeled.config;
        let range = config.date_range();
        let table = self.prices.fetch(&config.symbols(), &range)?;
        let benchmark = self.benchmark.and_then(|b| b.fetch_optional(&range));
        build_report(&labeled.label, config, &table, benchmark.as_ref())
    }

    /// Analyzes 2 to 5 configs from one shared price fetch and ranks them by
    /// total return, best first.
    pub fn compare(&self, configs: &[LabeledConfig]) -> Result<Vec<PortfolioReport>, RollfolioError> {
        if !(MIN_COMPARISON..=MAX_COMPARISON).contains(&configs.len()) {
            return Err(RollfolioError::config(format!(
                "comparison needs {MIN_COMPARISON} to {MAX_COMPARISON} portfolios, got {}",
                configs.len()
            )));
        }

        let (symbols, range) = fetch_plan(configs.iter().map(|c| &c.config))
            .ok_or_else(|| RollfolioError::config("no portfolios to compare"))?;
        info!(
            portfolios = configs.len(),
            symbols = symbols.len(),
            start = %range.start,
            end = %range.end,
            "comparing portfolios"
        );
        let table = self.prices.fetch(&symbols, &range)?;
        let benchmark = self.benchmark.and_then(|b| b.fetch_optional(&range));

        let mut reports = Vec::with_capacity(configs.len());
        for labeled in configs {
            let report = build_report(&labeled.label, &labeled.config, &table, benchmark.as_ref())
                .inspect_err(|e| error!(portfolio = %labeled.label, "analysis failed: {e}"))?;
            info!(
                portfolio = %labeled.label,
                "total return {:.2}%",
                report.metrics.total_return * 100.0
            );
            reports.push(report);
        }

        reports.sort_by(|a, b| b.metrics.total_return.total_cmp(&a.metrics.total_return));
        Ok(reports)
    }
}

/// Union of symbols and the smallest range covering every config, or `None`
/// when there are no configs.
pub fn fetch_plan<'c>(
    configs: impl IntoIterator<Item = &'c PortfolioConfig>,
) -> Option<(BTreeSet<String>, DateRange)> {
    let mut symbols = BTreeSet::new();
    let mut range: Option<DateRange> = None;
    for config in configs {
        symbols.extend(config.symbols());
        let r = config.date_range();
        range = Some(match range {
            Some(acc) => acc.union(&r),
            None => r,
        });
    }
    range.map(|r| (symbols, r))
}

fn build_report(
    label: &str,
    config: &PortfolioConfig,
    table: &PriceTable,
    benchmark: Option<&ValueSeries>,
) -> Result<PortfolioReport, RollfolioError> {
    let series = rollover::compose(config, table)?;

    let bench_slice = match (benchmark, series.first(), series.last()) {
        (Some(b), Some(first), Some(last)) => {
            Some(b.slice(first.date, last.date)).filter(|s| !s.is_empty())
        }
        _ => None,
    };
    let bench_slice = bench_slice.map(rebase);

    let metrics = MetricsRecord::derive(&series, bench_slice.as_ref())?;
    Ok(PortfolioReport {
        label: label.to_string(),
        series,
        metrics,
        benchmark: bench_slice,
        markers: transition_markers(config),
    })
}

/// Rescales so the first point is 100 again.
fn rebase(series: ValueSeries) -> ValueSeries {
    let Some(first) = series.first().map(|p| p.value) else {
        return series;
    };
    ValueSeries::from_points(
        series
            .points()
            .iter()
            .map(|p| ValuePoint {
                value: p.value / first * BASE_VALUE,
                ..*p
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::basket::Basket;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn labeled(label: &str, tickers: &[&str], start: NaiveDate, end: NaiveDate) -> LabeledConfig {
        LabeledConfig {
            label: label.into(),
            config: PortfolioConfig::new(
                vec![Basket::new(tickers.iter().map(|t| t.to_string()).collect(), start).unwrap()],
                end,
            )
            .unwrap(),
        }
    }

    struct CountingPort {
        table: PriceTable,
        calls: Cell<usize>,
        last_request: std::cell::RefCell<Option<(BTreeSet<String>, DateRange)>>,
    }

    impl PricePort for CountingPort {
        fn fetch(
            &self,
            symbols: &BTreeSet<String>,
            range: &DateRange,
        ) -> Result<PriceTable, RollfolioError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_request.borrow_mut() = Some((symbols.clone(), *range));
            Ok(self.table.subset(symbols, range))
        }
    }

    fn port() -> CountingPort {
        let mut table = PriceTable::new();
        table.insert("A", date(2024, 1, 2), 10.0);
        table.insert("A", date(2024, 1, 30), 11.0);
        table.insert("B", date(2024, 1, 2), 10.0);
        table.insert("B", date(2024, 1, 30), 13.0);
        table.insert("C", date(2024, 2, 1), 10.0);
        table.insert("C", date(2024, 2, 27), 9.0);
        CountingPort {
            table,
            calls: Cell::new(0),
            last_request: std::cell::RefCell::new(None),
        }
    }

    #[test]
    fn compare_rejects_out_of_bounds_counts() {
        let port = port();
        let analyzer = Analyzer::new(&port, None);
        let one = vec![labeled("One", &["A"], date(2024, 1, 1), date(2024, 2, 1))];
        assert!(matches!(analyzer.compare(&one), Err(RollfolioError::Config { .. })));
        let six: Vec<LabeledConfig> = (0..6)
            .map(|i| labeled(&format!("P{i}"), &["A"], date(2024, 1, 1), date(2024, 2, 1)))
            .collect();
        assert!(matches!(analyzer.compare(&six), Err(RollfolioError::Config { .. })));
        assert_eq!(port.calls.get(), 0);
    }

    #[test]
    fn compare_fetches_once_and_ranks_descending() {
        let port = port();
        let analyzer = Analyzer::new(&port, None);
        let configs = vec![
            labeled("Alpha", &["A"], date(2024, 1, 1), date(2024, 2, 1)),
            labeled("Beta", &["B"], date(2024, 1, 1), date(2024, 2, 1)),
            labeled("Gamma", &["C"], date(2024, 2, 1), date(2024, 3, 1)),
        ];

        let reports = analyzer.compare(&configs).unwrap();
        let labels: Vec<&str> = reports.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Beta", "Alpha", "Gamma"]);
        assert_eq!(port.calls.get(), 1);

        let (symbols, range) = port.last_request.borrow().clone().unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 3, 1));
    }

    #[test]
    fn analyze_without_benchmark_omits_fields() {
        let port = port();
        let analyzer = Analyzer::new(&port, None);
        let report = analyzer
            .analyze(&labeled("Alpha", &["A", "B"], date(2024, 1, 1), date(2024, 2, 1)))
            .unwrap();
        assert!(report.benchmark.is_none());
        assert!(report.metrics.benchmark_total_return.is_none());
        assert!((report.metrics.total_return - 0.2).abs() < 1e-12);
        assert_eq!(report.markers.len(), 1);
    }

    #[test]
    fn rebase_restarts_at_hundred() {
        let mut s = ValueSeries::new();
        s.push(date(2024, 1, 2), 110.0, 0);
        s.push(date(2024, 1, 3), 121.0, 0);
        let r = rebase(s);
        assert_eq!(r.first().unwrap().value, 100.0);
        assert!((r.last().unwrap().value - 110.0).abs() < 1e-9);
    }
}
