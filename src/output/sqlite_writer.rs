//! SQLite backend
//!
//! All tables live in one database file. A run replaces every table inside a
//! single transaction, so readers never see a half-written run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, info};

use crate::analytics::AnalysisReport;
use crate::output::tables::Table;
use crate::output::{render_all, ResultWriter, RunManifest, WriteSummary};

pub const DATABASE_FILE: &str = "session_analytics.db";

const MANIFEST_SCHEMA: &str = r#"
DROP TABLE IF EXISTS run_manifest;
CREATE TABLE run_manifest (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
) WITHOUT ROWID;
"#;

pub struct SqliteResultWriter {
    db_path: PathBuf,
}

impl SqliteResultWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        Ok(Self {
            db_path: output_dir.join(DATABASE_FILE),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn create_table_sql<T: Table>() -> String {
    let columns: Vec<String> = T::COLUMNS
        .iter()
        .map(|c| {
            let null = if c.nullable { "" } else { " NOT NULL" };
            format!("    {} {}{}", c.name, c.kind.sql_type(), null)
        })
        .collect();
    format!(
        "DROP TABLE IF EXISTS {name};\nCREATE TABLE {name} (\n{columns}\n);",
        name = T::NAME,
        columns = columns.join(",\n")
    )
}

fn replace_table<T: Table>(conn: &Connection, rows: &[T]) -> Result<()> {
    conn.execute_batch(&create_table_sql::<T>())
        .with_context(|| format!("Failed to create table {}", T::NAME))?;

    let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} VALUES ({})",
        T::NAME,
        placeholders
    ))?;
    for row in rows {
        stmt.execute(params_from_iter(row.sql_values()))
            .with_context(|| format!("Failed to insert into {}", T::NAME))?;
    }

    debug!(table = T::NAME, rows = rows.len(), "table replaced");
    Ok(())
}

impl ResultWriter for SqliteResultWriter {
    fn write(&mut self, report: &AnalysisReport) -> Result<WriteSummary> {
        let rendered = render_all(report)?;
        let manifest = RunManifest::new(report, &rendered);

        let mut conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open database: {:?}", self.db_path))?;
        let tx = conn.transaction()?;

        replace_table(&tx, &report.inventory)?;
        replace_table(&tx, &report.transactions)?;
        replace_table(&tx, &report.volatility)?;
        replace_table(&tx, &report.events)?;
        replace_table(&tx, &report.feedback_by_trader)?;
        replace_table(&tx, &report.feedback_by_session)?;
        replace_table(&tx, &report.session_level)?;

        tx.execute_batch(MANIFEST_SCHEMA)?;
        tx.execute(
            "INSERT INTO run_manifest (key, value) VALUES (?1, ?2)",
            params!["manifest", manifest.to_json()?],
        )?;

        tx.commit().context("Failed to commit results")?;

        info!(
            db = %self.db_path.display(),
            tables = manifest.tables.len(),
            "💾 results written"
        );

        Ok(WriteSummary {
            location: self.db_path.clone(),
            tables: manifest.tables,
        })
    }
}
