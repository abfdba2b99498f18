//! Per-session return series
//!
//! Log price, log return, simple return and raw price change for every
//! priced, timestamped transaction of a session, in session order. The
//! volatility and feedback stages both read `price_change` from here and
//! never difference prices themselves.

use chrono::{DateTime, Utc};

use crate::analytics::partition::Session;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint<'a> {
    pub transaction: &'a Transaction,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    /// Undefined for a non-positive price
    pub log_price: Option<f64>,
    /// Undefined for the first point and whenever either log price is undefined
    pub log_return: Option<f64>,
    pub simple_return: Option<f64>,
    /// Undefined only for the first point
    pub price_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries<'a> {
    pub session_id: &'a str,
    pub points: Vec<ReturnPoint<'a>>,
    /// Timestamped transactions dropped for an undefined price
    pub unpriced: usize,
}

impl<'a> ReturnSeries<'a> {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn log_returns(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.log_return)
    }

    pub fn simple_returns(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.simple_return)
    }

    pub fn non_positive_prices(&self) -> usize {
        self.points.iter().filter(|p| p.log_price.is_none()).count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnSeriesBuilder;

impl ReturnSeriesBuilder {
    pub fn build<'a>(&self, session: &'a Session) -> ReturnSeries<'a> {
        let mut points: Vec<ReturnPoint<'a>> = Vec::with_capacity(session.ordered_len());
        let mut unpriced = 0usize;

        for tx in session.ordered() {
            let Some(timestamp) = tx.timestamp else {
                continue;
            };
            let Some(price) = tx.price else {
                unpriced += 1;
                continue;
            };
            let log_price = (price > 0.0).then(|| price.ln());

            let (log_return, simple_return, price_change) = match points.last() {
                None => (None, None, None),
                Some(prev) => {
                    let log_return = match (log_price, prev.log_price) {
                        (Some(cur), Some(before)) => Some(cur - before),
                        _ => None,
                    };
                    let simple_return = (log_price.is_some() && prev.log_price.is_some())
                        .then(|| price / prev.price - 1.0);
                    (log_return, simple_return, Some(price - prev.price))
                }
            };

            points.push(ReturnPoint {
                transaction: tx,
                timestamp,
                price,
                log_price,
                log_return,
                simple_return,
                price_change,
            });
        }

        ReturnSeries {
            session_id: &session.session_id,
            points,
            unpriced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::partition::SessionPartitioner;
    use chrono::TimeZone;

    fn session(prices: &[Option<f64>]) -> Session {
        let ledger = prices
            .iter()
            .enumerate()
            .map(|(i, price)| Transaction {
                transaction_id: format!("t{}", i + 1),
                session_id: "s1".to_string(),
                timestamp: Some(Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap()),
                price: *price,
                quantity: Some(1.0),
                buyer_id: "A".to_string(),
                seller_id: "B".to_string(),
            })
            .collect();
        SessionPartitioner::new(false)
            .partition(ledger)
            .sessions
            .remove(0)
    }

    #[test]
    fn test_three_trade_series() {
        let session = session(&[Some(100.0), Some(102.0), Some(101.0)]);
        let series = ReturnSeriesBuilder.build(&session);

        assert_eq!(series.len(), 3);
        let first = &series.points[0];
        assert_eq!(first.log_return, None);
        assert_eq!(first.simple_return, None);
        assert_eq!(first.price_change, None);

        let second = &series.points[1];
        assert!(second.log_return.unwrap() > 0.0);
        assert!((second.log_return.unwrap() - (102.0f64 / 100.0).ln()).abs() < 1e-12);
        assert!((second.simple_return.unwrap() - 0.02).abs() < 1e-12);
        assert_eq!(second.price_change, Some(2.0));

        let third = &series.points[2];
        assert!(third.log_return.unwrap() < 0.0);
        assert_eq!(third.price_change, Some(-1.0));
    }

    #[test]
    fn test_unpriced_rows_dropped_before_differencing() {
        let session = session(&[None, Some(50.0), None, Some(55.0)]);
        let series = ReturnSeriesBuilder.build(&session);

        assert_eq!(series.unpriced, 2);
        assert_eq!(series.len(), 2);
        // t2 becomes the first point and has no return
        assert_eq!(series.points[0].transaction.transaction_id, "t2");
        assert_eq!(series.points[0].log_return, None);
        assert_eq!(series.points[1].price_change, Some(5.0));
    }

    #[test]
    fn test_non_positive_price_breaks_returns_not_price_change() {
        let session = session(&[Some(10.0), Some(0.0), Some(12.0), Some(13.0)]);
        let series = ReturnSeriesBuilder.build(&session);

        assert_eq!(series.non_positive_prices(), 1);
        assert_eq!(series.points[1].log_price, None);
        assert_eq!(series.points[1].log_return, None);
        assert_eq!(series.points[1].simple_return, None);
        assert_eq!(series.points[1].price_change, Some(-10.0));

        assert_eq!(series.points[2].log_return, None);
        assert_eq!(series.points[2].simple_return, None);
        assert_eq!(series.points[2].price_change, Some(12.0));

        assert!(series.points[3].log_return.is_some());
        assert_eq!(series.log_returns().count(), 1);
    }

    #[test]
    fn test_session_without_timestamps_is_empty() {
        let mut ledger = session(&[Some(1.0), Some(2.0)]).transactions;
        for tx in &mut ledger {
            tx.timestamp = None;
        }
        let session = SessionPartitioner::new(false)
            .partition(ledger)
            .sessions
            .remove(0);

        let series = ReturnSeriesBuilder.build(&session);
        assert!(series.is_empty());
        assert_eq!(series.unpriced, 0);
    }
}
