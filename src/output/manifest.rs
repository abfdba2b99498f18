//! Run manifest
//!
//! Deterministic description of a run: no wall-clock fields, so identical
//! input and configuration give an identical manifest.

use serde::{Deserialize, Serialize};

use crate::analytics::{AnalysisReport, RunAudit};
use crate::config::AnalysisConfig;
use crate::output::tables::RenderedTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDigest {
    pub name: String,
    pub rows: usize,
    pub sha256: String,
}

impl From<&RenderedTable> for TableDigest {
    fn from(table: &RenderedTable) -> Self {
        Self {
            name: table.name.to_string(),
            rows: table.rows,
            sha256: table.sha256(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub config: AnalysisConfig,
    pub audit: RunAudit,
    pub tables: Vec<TableDigest>,
}

impl RunManifest {
    pub fn new(report: &AnalysisReport, tables: &[RenderedTable]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: report.config.clone(),
            audit: report.audit.clone(),
            tables: tables.iter().map(TableDigest::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self).map(|mut json| {
            json.push('\n');
            json
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::render_all;

    #[test]
    fn test_manifest_lists_every_table() {
        let report = AnalysisReport::default();
        let tables = render_all(&report).unwrap();
        let manifest = RunManifest::new(&report, &tables);

        let names: Vec<&str> = manifest.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "inventory_by_session_trader",
                "transactions_with_volatility",
                "volatility_by_session",
                "feedback_events",
                "feedback_by_session_trader",
                "feedback_by_session",
                "session_level_dataset",
            ]
        );
        assert!(manifest.tables.iter().all(|t| t.rows == 0));
    }

    #[test]
    fn test_manifest_json_round_trips() {
        let report = AnalysisReport::default();
        let tables = render_all(&report).unwrap();
        let manifest = RunManifest::new(&report, &tables);

        let json = manifest.to_json().unwrap();
        assert!(json.ends_with('\n'));
        let parsed: RunManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.config.window_size, 10);
    }
}
