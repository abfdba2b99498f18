use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the ingestion boundary. Any of these halts the run
/// before a single statistic is computed.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Missing file: {0:?}")]
    MissingFile(PathBuf),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(
        "Missing or empty values in required columns: {} \
         ({count} rows, first at data row {first_row})",
        columns.join(", ")
    )]
    InvalidRows {
        columns: Vec<String>,
        count: usize,
        first_row: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Schema problems are caller errors; the rest are runtime failures.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            IngestError::MissingColumns(_) | IngestError::InvalidRows { .. }
        )
    }
}
