//! Equal-weighted performance curve for a single basket.

use crate::domain::basket::{Basket, Window};
use crate::domain::error::RollfolioError;
use crate::domain::price_table::PriceTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Dimensionless growth factor of a basket at a date, 1.0 at its first
/// in-window observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub factor: f64,
}

/// Evaluates `basket` over `window`.
///
/// Each ticker is normalized by its first close on or after `window.start`;
/// the basket factor at a date is the mean over the tickers that traded that
/// day. A ticker with no close anywhere in the window fails the basket.
pub fn evaluate(
    basket: &Basket,
    prices: &PriceTable,
    window: Window,
    basket_index: usize,
) -> Result<Vec<CurvePoint>, RollfolioError> {
    // date -> (sum of factors, contributing tickers)
    let mut accum: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    // Summing in symbol order keeps the result independent of listing order.
    let mut tickers: Vec<&String> = basket.tickers().iter().collect();
    tickers.sort();

    for ticker in tickers {
        let mut in_window = prices.prices(ticker).filter(|(d, _)| window.contains(*d));

        let Some((first_date, base)) = in_window.next() else {
            return Err(RollfolioError::data_unavailable(
                ticker.as_str(),
                window.start,
                window.end,
            ));
        };
        if base == 0.0 {
            return Err(RollfolioError::Compute {
                basket_index,
                reason: format!("{ticker} has a zero base price on {first_date}"),
            });
        }

        let first = accum.entry(first_date).or_insert((0.0, 0));
        first.0 += 1.0;
        first.1 += 1;

        for (date, price) in in_window {
            let slot = accum.entry(date).or_insert((0.0, 0));
            slot.0 += price / base;
            slot.1 += 1;
        }
    }

    Ok(accum
        .into_iter()
        .map(|(date, (sum, n))| CurvePoint {
            date,
            factor: sum / n as f64,
        })
        .collect())
}
