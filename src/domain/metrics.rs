//! Performance metrics derived from a value series.

use super::error::RollfolioError;
use super::value_series::ValueSeries;
use serde::Serialize;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Scalar statistics for one portfolio run. Returns are fractions
/// (0.32 = 32%). Optional fields are `None` when undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub volatility: f64,
    pub win_rate: f64,
    pub days_held: i64,
    pub benchmark_total_return: Option<f64>,
    pub outperformance: Option<f64>,
}

impl MetricsRecord {
    /// Derives the record for `series`, comparing against `benchmark` when
    /// one is given and non-empty.
    pub fn derive(
        series: &ValueSeries,
        benchmark: Option<&ValueSeries>,
    ) -> Result<Self, RollfolioError> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                return Err(RollfolioError::Compute {
                    basket_index: 0,
                    reason: "cannot derive metrics from an empty series".into(),
                });
            }
        };
        if first.value <= 0.0 || !first.value.is_finite() {
            return Err(RollfolioError::Compute {
                basket_index: first.basket_index,
                reason: format!("series starts at non-positive value {}", first.value),
            });
        }

        let growth = last.value / first.value;
        let total_return = growth - 1.0;

        let days_held = (last.date - first.date).num_days();
        let annualized_return = if days_held > 0 {
            growth.powf(CALENDAR_DAYS_PER_YEAR / days_held as f64) - 1.0
        } else {
            0.0
        };

        let values: Vec<f64> = series.values().collect();
        let returns = daily_returns(&values);
        let (sharpe_ratio, volatility) = compute_risk(&returns);
        let max_drawdown = compute_drawdown(&values);
        let win_rate = if returns.is_empty() {
            0.0
        } else {
            returns.iter().filter(|&&r| r > 0.0).count() as f64 / returns.len() as f64
        };

        let benchmark_total_return = benchmark.and_then(series_total_return);
        let outperformance = benchmark_total_return.map(|b| total_return - b);

        Ok(MetricsRecord {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            volatility,
            win_rate,
            days_held,
            benchmark_total_return,
            outperformance,
        })
    }

    /// `(name, value)` pairs in display order; `None` for undefined fields.
    pub fn fields(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("total_return", Some(self.total_return)),
            ("annualized_return", Some(self.annualized_return)),
            ("sharpe_ratio", self.sharpe_ratio),
            ("max_drawdown", Some(self.max_drawdown)),
            ("volatility", Some(self.volatility)),
            ("win_rate", Some(self.win_rate)),
            ("days_held", Some(self.days_held as f64)),
            ("benchmark_total_return", self.benchmark_total_return),
            ("outperformance", self.outperformance),
        ]
    }
}

fn series_total_return(series: &ValueSeries) -> Option<f64> {
    let first = series.first()?.value;
    let last = series.last()?.value;
    (first > 0.0).then(|| last / first - 1.0)
}

fn daily_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sharpe (zero risk-free rate) and annualized volatility, using the sample
/// standard deviation of daily returns.
fn compute_risk(returns: &[f64]) -> (Option<f64>, f64) {
    if returns.len() < 2 {
        return (None, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
    let sharpe = (stddev > 0.0).then(|| mean / stddev * annualizer);
    (sharpe, stddev * annualizer)
}

/// Most negative `value / running_max - 1`; 0.0 for a never-falling series.
fn compute_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        let dd = v / peak - 1.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_series(values: &[f64]) -> ValueSeries {
        let mut s = ValueSeries::new();
        for (i, &v) in values.iter().enumerate() {
            s.push(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                v,
                0,
            );
        }
        s
    }

    #[test]
    fn metrics_empty_series_is_compute_error() {
        let result = MetricsRecord::derive(&ValueSeries::new(), None);
        assert!(matches!(result, Err(RollfolioError::Compute { .. })));
    }

    #[test]
    fn metrics_total_return_positive() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 110.0]), None).unwrap();
        assert_relative_eq!(m.total_return, 0.10, epsilon = 1e-12);
        assert_eq!(m.days_held, 1);
    }

    #[test]
    fn metrics_total_return_negative() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 90.0]), None).unwrap();
        assert_relative_eq!(m.total_return, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn metrics_annualized_return_over_one_year() {
        let mut s = ValueSeries::new();
        s.push(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 100.0, 0);
        s.push(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 121.0, 0);
        let m = MetricsRecord::derive(&s, None).unwrap();
        assert_eq!(m.days_held, 365);
        assert_relative_eq!(m.annualized_return, 0.21, epsilon = 1e-12);
    }

    #[test]
    fn metrics_single_point_is_degenerate_not_error() {
        let m = MetricsRecord::derive(&make_series(&[100.0]), None).unwrap();
        assert_eq!(m.days_held, 0);
        assert_eq!(m.annualized_return, 0.0);
        assert_eq!(m.sharpe_ratio, None);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.win_rate, 0.0);
    }

    #[test]
    fn metrics_flat_series_has_no_sharpe() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 100.0, 100.0, 100.0]), None).unwrap();
        assert_eq!(m.sharpe_ratio, None);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn metrics_max_drawdown() {
        let dd = compute_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_relative_eq!(dd, 80.0 / 110.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn metrics_win_rate_counts_positive_days() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 101.0, 100.0, 100.0, 102.0]), None)
            .unwrap();
        assert_relative_eq!(m.win_rate, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn metrics_sharpe_and_volatility_use_sample_stddev() {
        let values = [100.0, 102.0, 101.0, 104.0];
        let returns = daily_returns(&values);
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let m = MetricsRecord::derive(&make_series(&values), None).unwrap();
        assert_relative_eq!(m.volatility, var.sqrt() * 252f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            m.sharpe_ratio.unwrap(),
            mean / var.sqrt() * 252f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn metrics_benchmark_fields() {
        let bench = make_series(&[100.0, 105.0]);
        let m = MetricsRecord::derive(&make_series(&[100.0, 110.0]), Some(&bench)).unwrap();
        assert_relative_eq!(m.benchmark_total_return.unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(m.outperformance.unwrap(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn metrics_without_benchmark_leave_fields_empty() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 110.0, 120.0]), None).unwrap();
        assert_eq!(m.benchmark_total_return, None);
        assert_eq!(m.outperformance, None);
        let empty = ValueSeries::new();
        let m = MetricsRecord::derive(&make_series(&[100.0, 110.0]), Some(&empty)).unwrap();
        assert_eq!(m.benchmark_total_return, None);
    }

    #[test]
    fn metrics_fields_cover_every_metric() {
        let m = MetricsRecord::derive(&make_series(&[100.0, 110.0]), None).unwrap();
        let names: Vec<&str> = m.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "total_return");
        assert_eq!(m.fields()[7].1, None);
    }

    proptest! {
        #[test]
        fn drawdown_is_bounded(values in prop::collection::vec(0.01f64..1_000.0, 1..200)) {
            let dd = compute_drawdown(&values);
            prop_assert!(dd <= 0.0);
            prop_assert!(dd >= -1.0);
        }
    }
}
