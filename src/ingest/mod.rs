//! Ledger ingestion
//!
//! Reads a transaction CSV, validates it against the required-field schema
//! and coerces values. Schema violations fail the whole load; unparsable
//! numbers and timestamps become undefined and are counted.

pub mod cleaning;
pub mod coerce;
pub mod schema;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::Transaction;

pub use cleaning::CleaningReport;
pub use schema::{ColumnMap, REQUIRED_COLUMNS};

/// Values present in the file that could not be coerced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadAudit {
    pub rows_read: usize,
    pub unparsable_timestamp: usize,
    pub unparsable_price: usize,
    pub unparsable_quantity: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedLedger {
    pub transactions: Vec<Transaction>,
    pub audit: LoadAudit,
}

pub struct TransactionLoader;

impl TransactionLoader {
    pub fn from_path(path: impl AsRef<Path>) -> Result<LoadedLedger, IngestError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IngestError::MissingFile(path.to_path_buf()));
        }

        info!(path = ?path, "📂 loading transaction ledger");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<LoadedLedger, IngestError> {
        // Ragged rows are read and reported as invalid, not as a csv error
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns = ColumnMap::resolve(reader.headers()?)?;

        let mut transactions = Vec::new();
        let mut audit = LoadAudit::default();
        let mut offending: BTreeSet<&'static str> = BTreeSet::new();
        let mut invalid_rows = 0usize;
        let mut first_invalid_row = None;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let mut row_valid = true;
            for column in REQUIRED_COLUMNS {
                let Some(idx) = columns.position(column) else {
                    continue;
                };
                let absent = idx >= record.len();
                let empty = schema::IDENTIFIER_COLUMNS.contains(&column) && field(idx).is_empty();
                if absent || empty {
                    offending.insert(column);
                    row_valid = false;
                }
            }
            if !row_valid {
                invalid_rows += 1;
                first_invalid_row.get_or_insert(row_idx + 1);
                continue;
            }

            let timestamp = coerce::parse_timestamp(field(columns.timestamp));
            if timestamp.is_none() && !field(columns.timestamp).is_empty() {
                audit.unparsable_timestamp += 1;
            }
            let price = coerce::parse_number(field(columns.price));
            if price.is_none() && !field(columns.price).is_empty() {
                audit.unparsable_price += 1;
            }
            let quantity = coerce::parse_number(field(columns.quantity));
            if quantity.is_none() && !field(columns.quantity).is_empty() {
                audit.unparsable_quantity += 1;
            }

            transactions.push(Transaction {
                transaction_id: field(columns.transaction_id).to_string(),
                session_id: field(columns.session_id).to_string(),
                timestamp,
                price,
                quantity,
                buyer_id: field(columns.buyer_id).to_string(),
                seller_id: field(columns.seller_id).to_string(),
            });
        }

        if let Some(first_row) = first_invalid_row {
            let columns: Vec<String> = REQUIRED_COLUMNS
                .iter()
                .filter(|c| offending.contains(*c))
                .map(|c| c.to_string())
                .collect();
            warn!(?columns, invalid_rows, first_row, "🛑 ledger rejected");
            return Err(IngestError::InvalidRows {
                columns,
                count: invalid_rows,
                first_row,
            });
        }

        audit.rows_read = transactions.len();
        debug!(
            rows = audit.rows_read,
            unparsable_timestamp = audit.unparsable_timestamp,
            unparsable_price = audit.unparsable_price,
            unparsable_quantity = audit.unparsable_quantity,
            "ledger coerced"
        );

        Ok(LoadedLedger {
            transactions,
            audit,
        })
    }
}
