//! CSV backend
//!
//! One `<table>.csv` per output table plus `manifest.json` in the output
//! directory. Existing files of a previous run are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analytics::AnalysisReport;
use crate::output::{render_all, ResultWriter, RunManifest, WriteSummary, MANIFEST_FILE};

pub struct CsvResultWriter {
    output_dir: PathBuf,
}

impl CsvResultWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.output_dir.join(format!("{table}.csv"))
    }
}

impl ResultWriter for CsvResultWriter {
    fn write(&mut self, report: &AnalysisReport) -> Result<WriteSummary> {
        let tables = render_all(report)?;

        for table in &tables {
            let path = self.table_path(table.name);
            fs::write(&path, &table.bytes)
                .with_context(|| format!("Failed to write table: {:?}", path))?;
            debug!(table = table.name, rows = table.rows, path = ?path, "table written");
        }

        let manifest = RunManifest::new(report, &tables);
        let json = manifest.to_json().context("Failed to serialize manifest")?;
        let path = self.output_dir.join(MANIFEST_FILE);
        fs::write(&path, json).with_context(|| format!("Failed to write manifest: {:?}", path))?;

        info!(
            dir = %self.output_dir.display(),
            tables = manifest.tables.len(),
            "💾 results written"
        );

        Ok(WriteSummary {
            location: self.output_dir.clone(),
            tables: manifest.tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalysisEngine;
    use crate::config::AnalysisConfig;
    use crate::models::Transaction;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn report() -> AnalysisReport {
        let ledger = [(100.0, 5.0, "A", "B"), (102.0, 3.0, "B", "A"), (101.0, 4.0, "A", "B")]
            .iter()
            .enumerate()
            .map(|(i, (price, qty, buyer, seller))| Transaction {
                transaction_id: format!("t{}", i + 1),
                session_id: "s1".to_string(),
                timestamp: Some(Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap()),
                price: Some(*price),
                quantity: Some(*qty),
                buyer_id: buyer.to_string(),
                seller_id: seller.to_string(),
            })
            .collect();
        AnalysisEngine::new(AnalysisConfig::default()).run(ledger)
    }

    #[test]
    fn test_writes_every_table_and_manifest() {
        let dir = TempDir::new().unwrap();
        let mut writer = CsvResultWriter::new(dir.path().join("out")).unwrap();
        let summary = writer.write(&report()).unwrap();

        assert_eq!(summary.tables.len(), 7);
        for table in &summary.tables {
            let path = writer.table_path(&table.name);
            assert!(path.exists(), "{:?}", path);
        }
        assert!(dir.path().join("out").join(MANIFEST_FILE).exists());

        let inventory_path = writer.table_path("inventory_by_session_trader");
        let inventory = fs::read_to_string(inventory_path).unwrap();
        assert_eq!(
            inventory,
            "session_id,trader_id,net_inventory\ns1,A,6.0\ns1,B,-6.0\n"
        );
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let mut writer = CsvResultWriter::new(dir.path()).unwrap();

        let first = writer.write(&report()).unwrap();
        let manifest_a = fs::read(dir.path().join(MANIFEST_FILE)).unwrap();
        let second = writer.write(&report()).unwrap();
        let manifest_b = fs::read(dir.path().join(MANIFEST_FILE)).unwrap();

        assert_eq!(first, second);
        assert_eq!(manifest_a, manifest_b);
    }
}
