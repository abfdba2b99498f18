//! Rolling and realized volatility
//!
//! Rolling volatility at point `i` is the sample standard deviation of the
//! last `W` defined log returns at or before `i`. Realized volatility is the
//! sample standard deviation over every defined return of the session.

use crate::analytics::returns::ReturnSeries;
use crate::analytics::stats::sample_std;
use crate::models::{PricePoint, VolatilitySummary};

pub const DEFAULT_WINDOW_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionVolatility {
    pub points: Vec<PricePoint>,
    /// `None` only for an empty series
    pub summary: Option<VolatilitySummary>,
}

#[derive(Debug, Clone, Copy)]
pub struct VolatilityEngine {
    window_size: usize,
}

impl Default for VolatilityEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl VolatilityEngine {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn analyze(&self, series: &ReturnSeries<'_>) -> SessionVolatility {
        let rolling = self.rolling(series);
        let points = series
            .points
            .iter()
            .zip(rolling)
            .map(|(point, rolling_volatility)| {
                let tx = point.transaction;
                PricePoint {
                    session_id: tx.session_id.clone(),
                    transaction_id: tx.transaction_id.clone(),
                    timestamp: point.timestamp,
                    price: point.price,
                    quantity: tx.quantity,
                    buyer_id: tx.buyer_id.clone(),
                    seller_id: tx.seller_id.clone(),
                    log_price: point.log_price,
                    log_return: point.log_return,
                    simple_return: point.simple_return,
                    price_change: point.price_change,
                    rolling_volatility,
                }
            })
            .collect();

        SessionVolatility {
            points,
            summary: self.summarize(series),
        }
    }

    /// One value per point; all undefined when `W <= 1`.
    pub fn rolling(&self, series: &ReturnSeries<'_>) -> Vec<Option<f64>> {
        let w = self.window_size;
        if w <= 1 {
            return vec![None; series.len()];
        }

        let mut defined: Vec<f64> = Vec::with_capacity(series.len());
        series
            .points
            .iter()
            .map(|point| {
                if let Some(r) = point.log_return {
                    defined.push(r);
                }
                if defined.len() >= w {
                    sample_std(&defined[defined.len() - w..])
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn summarize(&self, series: &ReturnSeries<'_>) -> Option<VolatilitySummary> {
        let first = series.points.first()?;
        let last = series.points.last()?;

        Some(VolatilitySummary {
            session_id: series.session_id.to_string(),
            n_trades: series.len(),
            price_first: first.price,
            price_last: last.price,
            realized_vol_logret: realized(&series.log_returns().collect::<Vec<_>>()),
            realized_vol_ret: realized(&series.simple_returns().collect::<Vec<_>>()),
        })
    }
}

/// Session-level spread: undefined below two returns and for a session whose
/// returns have zero variance.
fn realized(returns: &[f64]) -> Option<f64> {
    sample_std(returns).filter(|std| *std > 0.0)
}
