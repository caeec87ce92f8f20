//! Portfolio value over time and its chart-ready projection.

use crate::domain::basket::PortfolioConfig;
use chrono::NaiveDate;
use serde::Serialize;

/// Starting value of every composed or normalized series.
pub const BASE_VALUE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
    pub basket_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueSeries {
    points: Vec<ValuePoint>,
}

impl ValueSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<ValuePoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, date: NaiveDate, value: f64, basket_index: usize) {
        self.points.push(ValuePoint {
            date,
            value,
            basket_index,
        });
    }

    pub fn points(&self) -> &[ValuePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ValuePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ValuePoint> {
        self.points.last()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Points dated within `[start, end]`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> ValueSeries {
        ValueSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Dates where the producing basket changes, including the first point.
    pub fn transition_dates(&self) -> Vec<(NaiveDate, usize)> {
        let mut out = Vec::new();
        let mut current: Option<usize> = None;
        for p in &self.points {
            if current != Some(p.basket_index) {
                out.push((p.date, p.basket_index));
                current = Some(p.basket_index);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMarker {
    pub date: NaiveDate,
    pub basket_index: usize,
    pub label: String,
}

/// Markers at each basket's configured start date.
pub fn transition_markers(config: &PortfolioConfig) -> Vec<TransitionMarker> {
    config
        .baskets()
        .iter()
        .enumerate()
        .map(|(i, b)| TransitionMarker {
            date: b.start_date(),
            basket_index: i,
            label: b.label(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered points plus basket-transition markers, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub label: String,
    pub points: Vec<ChartPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<Vec<ChartPoint>>,
    pub markers: Vec<TransitionMarker>,
}

impl ChartData {
    pub fn build(
        label: &str,
        series: &ValueSeries,
        benchmark: Option<&ValueSeries>,
        markers: Vec<TransitionMarker>,
    ) -> Self {
        let to_points = |s: &ValueSeries| -> Vec<ChartPoint> {
            s.points()
                .iter()
                .map(|p| ChartPoint {
                    date: p.date,
                    value: p.value,
                })
                .collect()
        };
        Self {
            label: label.to_string(),
            points: to_points(series),
            benchmark: benchmark.filter(|b| !b.is_empty()).map(to_points),
            markers,
        }
    }
}
