//! Run configuration
//!
//! Analysis parameters plus input/output locations. Loaded from a TOML file,
//! then overridden by environment variables, then by CLI flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analytics::DEFAULT_WINDOW_SIZE;

pub const ENV_CONFIG_PATH: &str = "SESSION_ANALYTICS_CONFIG";
pub const ENV_WINDOW: &str = "SESSION_ANALYTICS_WINDOW";
pub const ENV_EXCLUDE_SELF_TRADES: &str = "SESSION_ANALYTICS_EXCLUDE_SELF_TRADES";
pub const ENV_INPUT: &str = "SESSION_ANALYTICS_INPUT";
pub const ENV_OUTPUT_DIR: &str = "SESSION_ANALYTICS_OUTPUT_DIR";

/// Parameters that change the statistical result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of trailing log returns in the rolling volatility window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Drop transactions whose buyer and seller are the same trader
    #[serde(default)]
    pub exclude_self_trades: bool,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            exclude_self_trades: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Sqlite => "sqlite",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "sqlite" | "db" => Ok(OutputFormat::Sqlite),
            other => bail!("unknown output format '{}' (expected csv or sqlite)", other),
        }
    }
}

/// Full configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Transaction ledger (CSV)
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory receiving result tables
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_input() -> PathBuf {
    PathBuf::from("data/transactions.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Malformed config file: {:?}", path))?;
        Ok(config)
    }

    /// Load the file named by `SESSION_ANALYTICS_CONFIG` (if any), then apply
    /// environment overrides.
    ///
    /// A config path that is set but unreadable is an error, never a
    /// fallback to defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(ENV_WINDOW) {
            self.analysis.window_size = raw.trim().parse().with_context(|| {
                format!("{} must be a non-negative integer, got '{}'", ENV_WINDOW, raw)
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_EXCLUDE_SELF_TRADES) {
            self.analysis.exclude_self_trades = parse_flag(&raw).with_context(|| {
                format!("{} must be a boolean, got '{}'", ENV_EXCLUDE_SELF_TRADES, raw)
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_INPUT) {
            self.input = PathBuf::from(raw);
        }
        if let Ok(raw) = std::env::var(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "on" | "ON" | "yes" => Ok(true),
        "0" | "false" | "FALSE" | "off" | "OFF" | "no" => Ok(false),
        other => bail!("unrecognised flag value '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.analysis.window_size, 10);
        assert!(!config.analysis.exclude_self_trades);
        assert_eq!(config.format, OutputFormat::Csv);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            input = "ledger.csv"

            [analysis]
            exclude_self_trades = true
            "#,
        )
        .expect("parse");

        assert_eq!(config.input, PathBuf::from("ledger.csv"));
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert_eq!(config.analysis.window_size, 10);
        assert!(config.analysis.exclude_self_trades);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.toml");

        let mut config = RunConfig::default();
        config.analysis.window_size = 25;
        config.format = OutputFormat::Sqlite;
        config.save(&path).expect("save");

        assert_eq!(RunConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(RunConfig::load("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("sqlite".parse::<OutputFormat>().unwrap(), OutputFormat::Sqlite);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
