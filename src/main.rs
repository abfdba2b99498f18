//! Session Analytics
//!
//! Loads a transaction ledger, analyzes every trading session and writes the
//! result tables.
//!
//! Usage:
//!   cargo run --release -- run --input ./data/transactions.csv --output-dir ./results
//!   cargo run --release -- run --config ./session_analytics.toml --format sqlite
//!   cargo run --release -- config --window 20 --save ./session_analytics.toml
//!
//! Exit codes: 0 success, 2 configuration or schema violation, 3 runtime failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_analytics::config::ENV_CONFIG_PATH;
use session_analytics::ingest::CleaningReport;
use session_analytics::output::{writer_for, WriteSummary};
use session_analytics::{AnalysisEngine, IngestError, OutputFormat, RunConfig, TransactionLoader};

const EXIT_CONFIG: u8 = 2;
const EXIT_RUNTIME: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "session-analytics")]
#[command(version, about = "Session-scoped inventory, volatility and feedback analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, analyze and write results
    Run(RunArgs),

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        args: RunArgs,

        /// Write to this file instead of stdout
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Transaction ledger (CSV)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving the result tables
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rolling volatility window (number of log returns)
    #[arg(short, long)]
    window: Option<usize>,

    /// Drop transactions whose buyer and seller are the same trader
    /// (`--exclude-self-trades=false` keeps them)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    exclude_self_trades: Option<bool>,

    /// Output backend: csv or sqlite
    #[arg(short, long)]
    format: Option<OutputFormat>,
}

impl RunArgs {
    /// File, then environment, then flags.
    fn resolve(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        config.apply_env_overrides()?;

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(window) = self.window {
            config.analysis.window_size = window;
        }
        if let Some(exclude) = self.exclude_self_trades {
            config.analysis.exclude_self_trades = exclude;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }
}

/// A halted run and the exit code it maps to.
struct Failure {
    code: u8,
    error: anyhow::Error,
}

impl Failure {
    fn config(error: impl Into<anyhow::Error>) -> Self {
        Self {
            code: EXIT_CONFIG,
            error: error.into(),
        }
    }

    fn runtime(error: impl Into<anyhow::Error>) -> Self {
        Self {
            code: EXIT_RUNTIME,
            error: error.into(),
        }
    }
}

impl From<IngestError> for Failure {
    fn from(err: IngestError) -> Self {
        if err.is_schema_violation() || matches!(err, IngestError::MissingFile(_)) {
            Self::config(err)
        } else {
            Self::runtime(err)
        }
    }
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let outcome = match cli.command {
        Commands::Run(args) => run(&args).map(print_summary),
        Commands::Config { args, save } => show_config(&args, save),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(code = failure.code, "❌ {:#}", failure.error);
            eprintln!("Error: {:#}", failure.error);
            ExitCode::from(failure.code)
        }
    }
}

fn run(args: &RunArgs) -> Result<WriteSummary, Failure> {
    let config = args.resolve().map_err(Failure::config)?;
    info!(
        input = ?config.input,
        output_dir = ?config.output_dir,
        format = config.format.as_str(),
        "🚀 session analytics run"
    );

    let ledger = TransactionLoader::from_path(&config.input)?;
    CleaningReport::from_transactions(&ledger.transactions).log();

    let engine = AnalysisEngine::new(config.analysis.clone());
    let report = engine.run(ledger.transactions);

    let mut writer = writer_for(config.format, &config.output_dir).map_err(Failure::runtime)?;
    writer.write(&report).map_err(Failure::runtime)
}

fn show_config(args: &RunArgs, output: Option<PathBuf>) -> Result<(), Failure> {
    let config = args.resolve().map_err(Failure::config)?;
    match output {
        Some(path) => config
            .save(&path)
            .with_context(|| format!("Failed to save config: {:?}", path))
            .map_err(Failure::runtime),
        None => {
            let toml = toml::to_string_pretty(&config).map_err(Failure::runtime)?;
            print!("{}", toml);
            Ok(())
        }
    }
}

fn print_summary(summary: WriteSummary) {
    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║                 SESSION ANALYTICS RESULTS                      ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Output: {}", summary.location.display());
    println!();
    println!("{:<32} {:>10}  {}", "Table", "Rows", "SHA-256");
    println!("{}", "-".repeat(110));
    for table in &summary.tables {
        println!("{:<32} {:>10}  {}", table.name, table.rows, table.sha256);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_analytics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
