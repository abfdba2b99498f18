//! Session partitioning
//!
//! Groups the ledger by session and fixes the intra-session time order that
//! every differencing and rolling stage relies on.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::Transaction;

/// All transactions of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    /// Every transaction of the session in ledger order, timestamped or not.
    pub transactions: Vec<Transaction>,
    /// Indices into `transactions` of the timestamped ones, ascending by
    /// timestamp with ties kept in ledger order.
    order: Vec<usize>,
}

impl Session {
    fn new(session_id: String, transactions: Vec<Transaction>) -> Self {
        let mut order: Vec<usize> = transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.timestamp.is_some())
            .map(|(idx, _)| idx)
            .collect();
        // sort_by_key is stable
        order.sort_by_key(|&idx| transactions[idx].timestamp);

        Self {
            session_id,
            transactions,
            order,
        }
    }

    /// Timestamped transactions in session order.
    pub fn ordered(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.order.iter().map(move |&idx| &self.transactions[idx])
    }

    pub fn ordered_len(&self) -> usize {
        self.order.len()
    }

    pub fn untimestamped(&self) -> usize {
        self.transactions.len() - self.order.len()
    }

    pub fn coverage(&self) -> SessionCoverage {
        let traders: BTreeSet<&str> = self
            .transactions
            .iter()
            .flat_map(|tx| [tx.buyer_id.as_str(), tx.seller_id.as_str()])
            .collect();

        SessionCoverage {
            session_id: self.session_id.clone(),
            rows: self.transactions.len(),
            timestamped: self.ordered_len(),
            first: self.ordered().next().and_then(|tx| tx.timestamp),
            last: self.ordered().last().and_then(|tx| tx.timestamp),
            traders: traders.len(),
            self_trades: self.transactions.iter().filter(|tx| tx.is_self_trade()).count(),
        }
    }
}

/// Row counts, time range and trader count of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCoverage {
    pub session_id: String,
    pub rows: usize,
    pub timestamped: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    /// Distinct buyers and sellers, timestamped or not
    pub traders: usize,
    pub self_trades: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedLedger {
    /// Sessions ascending by id.
    pub sessions: Vec<Session>,
    pub self_trades_removed: usize,
}

impl PartitionedLedger {
    pub fn transaction_count(&self) -> usize {
        self.sessions.iter().map(|s| s.transactions.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPartitioner {
    exclude_self_trades: bool,
}

impl SessionPartitioner {
    pub fn new(exclude_self_trades: bool) -> Self {
        Self {
            exclude_self_trades,
        }
    }

    /// Apply the self-trade gate once, then split by session.
    pub fn partition(&self, ledger: Vec<Transaction>) -> PartitionedLedger {
        let total = ledger.len();
        let kept: Vec<Transaction> = if self.exclude_self_trades {
            ledger.into_iter().filter(|tx| !tx.is_self_trade()).collect()
        } else {
            ledger
        };
        let self_trades_removed = total - kept.len();

        let mut grouped: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();
        for tx in kept {
            grouped.entry(tx.session_id.clone()).or_default().push(tx);
        }

        let sessions: Vec<Session> = grouped
            .into_iter()
            .map(|(session_id, transactions)| Session::new(session_id, transactions))
            .collect();

        debug!(
            sessions = sessions.len(),
            self_trades_removed, "ledger partitioned"
        );

        PartitionedLedger {
            sessions,
            self_trades_removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    fn tx(
        id: &str,
        session: &str,
        ts: Option<DateTime<Utc>>,
        buyer: &str,
        seller: &str,
    ) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            session_id: session.to_string(),
            timestamp: ts,
            price: Some(100.0),
            quantity: Some(1.0),
            buyer_id: buyer.to_string(),
            seller_id: seller.to_string(),
        }
    }

    fn ordered_ids(session: &Session) -> Vec<&str> {
        session.ordered().map(|t| t.transaction_id.as_str()).collect()
    }

    #[test]
    fn test_sessions_sorted_by_id() {
        let ledger = vec![
            tx("t1", "s2", at(0), "A", "B"),
            tx("t2", "s1", at(0), "A", "B"),
            tx("t3", "s3", at(0), "A", "B"),
        ];
        let partitioned = SessionPartitioner::new(false).partition(ledger);
        let ids: Vec<&str> = partitioned.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_time_order_with_stable_ties() {
        let ledger = vec![
            tx("late", "s1", at(30), "A", "B"),
            tx("tie_a", "s1", at(10), "A", "B"),
            tx("early", "s1", at(0), "A", "B"),
            tx("tie_b", "s1", at(10), "A", "B"),
            tx("tie_c", "s1", at(10), "A", "B"),
        ];
        let partitioned = SessionPartitioner::new(false).partition(ledger);
        assert_eq!(
            ordered_ids(&partitioned.sessions[0]),
            vec!["early", "tie_a", "tie_b", "tie_c", "late"]
        );
    }

    #[test]
    fn test_untimestamped_kept_but_not_ordered() {
        let ledger = vec![
            tx("t1", "s1", at(5), "A", "B"),
            tx("t2", "s1", None, "A", "B"),
            tx("t3", "s1", at(1), "A", "B"),
        ];
        let partitioned = SessionPartitioner::new(false).partition(ledger);
        let session = &partitioned.sessions[0];

        assert_eq!(session.transactions.len(), 3);
        assert_eq!(session.ordered_len(), 2);
        assert_eq!(session.untimestamped(), 1);
        assert_eq!(ordered_ids(session), vec!["t3", "t1"]);
    }

    #[test]
    fn test_coverage_counts() {
        let ledger = vec![
            tx("t1", "s1", at(5), "A", "B"),
            tx("t2", "s1", None, "C", "C"),
            tx("t3", "s1", at(1), "B", "A"),
            tx("t4", "s1", at(9), "D", "A"),
        ];
        let partitioned = SessionPartitioner::new(false).partition(ledger);
        let coverage = partitioned.sessions[0].coverage();

        assert_eq!(coverage.session_id, "s1");
        assert_eq!(coverage.rows, 4);
        assert_eq!(coverage.timestamped, 3);
        assert_eq!(coverage.first, at(1));
        assert_eq!(coverage.last, at(9));
        assert_eq!(coverage.traders, 4);
        assert_eq!(coverage.self_trades, 1);
    }

    #[test]
    fn test_coverage_without_timestamps() {
        let ledger = vec![tx("t1", "s1", None, "A", "B")];
        let partitioned = SessionPartitioner::new(false).partition(ledger);
        let coverage = partitioned.sessions[0].coverage();

        assert_eq!(coverage.timestamped, 0);
        assert_eq!(coverage.first, None);
        assert_eq!(coverage.last, None);
        assert_eq!(coverage.traders, 2);
    }

    #[test]
    fn test_self_trade_gate() {
        let ledger = vec![
            tx("t1", "s1", at(0), "A", "B"),
            tx("t2", "s1", at(1), "A", "A"),
            tx("t3", "s2", at(0), "C", "C"),
        ];

        let unfiltered = SessionPartitioner::new(false).partition(ledger.clone());
        assert_eq!(unfiltered.self_trades_removed, 0);
        assert_eq!(unfiltered.transaction_count(), 3);

        let filtered = SessionPartitioner::new(true).partition(ledger);
        assert_eq!(filtered.self_trades_removed, 2);
        assert_eq!(filtered.transaction_count(), 1);
        // s2 only held a self-trade
        assert_eq!(filtered.sessions.len(), 1);
    }

    #[test]
    fn test_empty_ledger() {
        let partitioned = SessionPartitioner::new(true).partition(Vec::new());
        assert!(partitioned.sessions.is_empty());
        assert_eq!(partitioned.self_trades_removed, 0);
    }
}
