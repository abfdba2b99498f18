//! Result writers
//!
//! Every backend receives the full `AnalysisReport` and persists the seven
//! output tables plus a run manifest. Tables are rendered to CSV bytes first;
//! their SHA-256 digests identify the content independent of the backend.

pub mod csv_writer;
pub mod manifest;
pub mod sqlite_writer;
pub mod tables;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::analytics::AnalysisReport;
use crate::config::OutputFormat;

pub use csv_writer::CsvResultWriter;
pub use manifest::{RunManifest, TableDigest};
pub use sqlite_writer::SqliteResultWriter;
pub use tables::{render_csv, RenderedTable, Table};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    /// Directory or database file written
    pub location: PathBuf,
    pub tables: Vec<TableDigest>,
}

pub trait ResultWriter {
    fn write(&mut self, report: &AnalysisReport) -> Result<WriteSummary>;
}

/// Render all seven tables in their fixed output order.
pub fn render_all(report: &AnalysisReport) -> Result<Vec<RenderedTable>> {
    Ok(vec![
        render_csv(&report.inventory)?,
        render_csv(&report.transactions)?,
        render_csv(&report.volatility)?,
        render_csv(&report.events)?,
        render_csv(&report.feedback_by_trader)?,
        render_csv(&report.feedback_by_session)?,
        render_csv(&report.session_level)?,
    ])
}

pub fn writer_for(format: OutputFormat, output_dir: &Path) -> Result<Box<dyn ResultWriter>> {
    Ok(match format {
        OutputFormat::Csv => Box::new(CsvResultWriter::new(output_dir)?),
        OutputFormat::Sqlite => Box::new(SqliteResultWriter::new(output_dir)?),
    })
}
