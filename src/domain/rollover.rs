//! Chains basket curves into one compounded value series.

use crate::domain::basket::PortfolioConfig;
use crate::domain::basket_engine;
use crate::domain::error::RollfolioError;
use crate::domain::price_table::PriceTable;
use crate::domain::value_series::{BASE_VALUE, ValueSeries};
use tracing::info;

/// Composes the portfolio value series.
///
/// Basket `i` starts from the last value basket `i - 1` produced, so basket
/// returns multiply. Baskets are evaluated strictly in order.
pub fn compose(config: &PortfolioConfig, prices: &PriceTable) -> Result<ValueSeries, RollfolioError> {
    let mut series = ValueSeries::new();
    let mut base_value = BASE_VALUE;

    for (i, basket) in config.baskets().iter().enumerate() {
        let window = config.window(i);
        let curve = basket_engine::evaluate(basket, prices, window, i)?;

        let Some(last) = curve.last() else {
            return Err(RollfolioError::Compute {
                basket_index: i,
                reason: "basket produced an empty curve".into(),
            });
        };
        let end_factor = last.factor;

        for point in &curve {
            series.push(point.date, base_value * point.factor, i);
        }

        info!(
            basket = i + 1,
            start = %window.start,
            end = %window.end,
            symbols = basket.tickers().len(),
            "basket return {:.2}%",
            (end_factor - 1.0) * 100.0
        );

        base_value *= end_factor;
        if !base_value.is_finite() || base_value <= 0.0 {
            return Err(RollfolioError::Compute {
                basket_index: i,
                reason: format!("portfolio value became {base_value}"),
            });
        }
    }

    Ok(series)
}
