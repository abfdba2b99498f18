//! Ledger quality report: missing fields, duplicate ids, self-trades.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{rate, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub tx_count: usize,
    pub missing_timestamp: usize,
    pub missing_price: usize,
    pub missing_quantity: usize,
    pub duplicate_transaction_ids: usize,
    pub self_trade_count: usize,
    /// Undefined for an empty ledger
    pub self_trade_rate: Option<f64>,
}

impl CleaningReport {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut seen: HashSet<&str> = HashSet::with_capacity(transactions.len());
        let mut report = Self {
            tx_count: transactions.len(),
            ..Self::default()
        };

        for tx in transactions {
            if tx.timestamp.is_none() {
                report.missing_timestamp += 1;
            }
            if tx.price.is_none() {
                report.missing_price += 1;
            }
            if tx.quantity.is_none() {
                report.missing_quantity += 1;
            }
            if !seen.insert(tx.transaction_id.as_str()) {
                report.duplicate_transaction_ids += 1;
            }
            if tx.is_self_trade() {
                report.self_trade_count += 1;
            }
        }

        report.self_trade_rate = rate(report.self_trade_count, report.tx_count);
        report
    }

    pub fn log(&self) {
        info!(
            tx_count = self.tx_count,
            missing_timestamp = self.missing_timestamp,
            missing_price = self.missing_price,
            missing_quantity = self.missing_quantity,
            duplicate_transaction_ids = self.duplicate_transaction_ids,
            self_trade_count = self.self_trade_count,
            self_trade_rate = ?self.self_trade_rate,
            "🧹 ledger cleaning report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(id: &str, buyer: &str, seller: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            session_id: "s1".to_string(),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            price: Some(10.0),
            quantity: Some(1.0),
            buyer_id: buyer.to_string(),
            seller_id: seller.to_string(),
        }
    }

    #[test]
    fn test_counts() {
        let mut missing = tx("t3", "A", "B");
        missing.timestamp = None;
        missing.quantity = None;

        let report = CleaningReport::from_transactions(&[
            tx("t1", "A", "B"),
            tx("t2", "C", "C"),
            missing,
            tx("t1", "B", "A"),
        ]);

        assert_eq!(report.tx_count, 4);
        assert_eq!(report.missing_timestamp, 1);
        assert_eq!(report.missing_price, 0);
        assert_eq!(report.missing_quantity, 1);
        assert_eq!(report.duplicate_transaction_ids, 1);
        assert_eq!(report.self_trade_count, 1);
        assert_eq!(report.self_trade_rate, Some(0.25));
    }

    #[test]
    fn test_empty_ledger_has_undefined_rate() {
        let report = CleaningReport::from_transactions(&[]);
        assert_eq!(report.tx_count, 0);
        assert_eq!(report.self_trade_rate, None);
    }
}
