//! Session Analytics Library
//!
//! Session-scoped trade analytics over a transaction ledger: per-trader
//! inventory, return series with rolling and realized volatility, and a
//! feedback-trading classification of every trader leg.
//!
//! Exposes core modules for use by binaries and tests.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod output;
pub mod report;

pub use analytics::{AnalysisEngine, AnalysisReport, RunAudit};
pub use config::{AnalysisConfig, OutputFormat, RunConfig};
pub use error::IngestError;
pub use ingest::{LoadedLedger, TransactionLoader};
