//! Required-field schema for transaction ledgers.

use std::collections::HashMap;

use csv::StringRecord;

use crate::error::IngestError;

pub const SESSION_ID: &str = "trading_session_id";
pub const TRANSACTION_ID: &str = "transaction_id";
pub const TIMESTAMP: &str = "timestamp";
pub const PRICE: &str = "price";
pub const QUANTITY: &str = "quantity";
pub const BUYER_ID: &str = "buyer_id";
pub const SELLER_ID: &str = "seller_id";

/// Every column a ledger must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    SESSION_ID,
    TRANSACTION_ID,
    TIMESTAMP,
    PRICE,
    QUANTITY,
    BUYER_ID,
    SELLER_ID,
];

/// Identifier columns that may never be empty.
pub const IDENTIFIER_COLUMNS: [&str; 4] = [SESSION_ID, TRANSACTION_ID, BUYER_ID, SELLER_ID];

/// Legacy header names accepted in place of the canonical ones.
const ALIASES: [(&str, &str); 4] = [
    ("trading_session_uuid", SESSION_ID),
    ("bid_trader_uuid", BUYER_ID),
    ("ask_trader_uuid", SELLER_ID),
    ("timestamp_dt", TIMESTAMP),
];

/// Column positions of the required fields in one ledger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub session_id: usize,
    pub transaction_id: usize,
    pub timestamp: usize,
    pub price: usize,
    pub quantity: usize,
    pub buyer_id: usize,
    pub seller_id: usize,
}

impl ColumnMap {
    /// Resolve required columns against a header row.
    ///
    /// Canonical names win over aliases. Every absent column is reported in
    /// one error.
    pub fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for (idx, name) in headers.iter().enumerate() {
            let name = name.trim();
            if let Some(canonical) = REQUIRED_COLUMNS.iter().find(|c| **c == name) {
                positions.entry(*canonical).or_insert(idx);
            }
        }

        for (idx, name) in headers.iter().enumerate() {
            let name = name.trim();
            if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
                positions.entry(*canonical).or_insert(idx);
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }

        Ok(Self {
            session_id: positions[SESSION_ID],
            transaction_id: positions[TRANSACTION_ID],
            timestamp: positions[TIMESTAMP],
            price: positions[PRICE],
            quantity: positions[QUANTITY],
            buyer_id: positions[BUYER_ID],
            seller_id: positions[SELLER_ID],
        })
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        match column {
            SESSION_ID => Some(self.session_id),
            TRANSACTION_ID => Some(self.transaction_id),
            TIMESTAMP => Some(self.timestamp),
            PRICE => Some(self.price),
            QUANTITY => Some(self.quantity),
            BUYER_ID => Some(self.buyer_id),
            SELLER_ID => Some(self.seller_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn test_resolve_canonical_headers() {
        let map = ColumnMap::resolve(&headers(&[
            "transaction_id",
            "trading_session_id",
            "timestamp",
            "price",
            "quantity",
            "buyer_id",
            "seller_id",
            "extra",
        ]))
        .expect("resolve");

        assert_eq!(map.transaction_id, 0);
        assert_eq!(map.session_id, 1);
        assert_eq!(map.seller_id, 6);
    }

    #[test]
    fn test_resolve_legacy_aliases_and_whitespace() {
        let map = ColumnMap::resolve(&headers(&[
            " trading_session_uuid ",
            "transaction_id",
            "timestamp_dt",
            "price",
            "quantity",
            "bid_trader_uuid",
            "ask_trader_uuid",
        ]))
        .expect("resolve");

        assert_eq!(map.session_id, 0);
        assert_eq!(map.timestamp, 2);
        assert_eq!(map.buyer_id, 5);
        assert_eq!(map.seller_id, 6);
    }

    #[test]
    fn test_canonical_timestamp_preferred_over_alias() {
        let map = ColumnMap::resolve(&headers(&[
            "timestamp_dt",
            "trading_session_id",
            "transaction_id",
            "timestamp",
            "price",
            "quantity",
            "buyer_id",
            "seller_id",
        ]))
        .expect("resolve");

        assert_eq!(map.timestamp, 3);
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let err = ColumnMap::resolve(&headers(&["trading_session_id", "price", "buyer_id"]))
            .expect_err("should fail");

        match err {
            IngestError::MissingColumns(missing) => assert_eq!(
                missing,
                vec!["transaction_id", "timestamp", "quantity", "seller_id"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }
}
