//! Ledger Inspection Tool
//!
//! CLI tool to check a transaction ledger before analysis: schema, coercion
//! failures, duplicate ids, self-trades and per-session coverage.
//!
//! Usage:
//!   cargo run --release --bin ledger_inspect -- --input ./data/transactions.csv report
//!   cargo run --release --bin ledger_inspect -- --input ./data/transactions.csv coverage
//!   cargo run --release --bin ledger_inspect -- proof --output ./ledger_proof.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use session_analytics::analytics::{SessionCoverage, SessionPartitioner};
use session_analytics::ingest::{CleaningReport, LoadAudit};
use session_analytics::{RunConfig, TransactionLoader};

/// Ledger Inspection Tool for Session Analytics
#[derive(Parser, Debug)]
#[command(name = "ledger_inspect")]
#[command(about = "Inspect a transaction ledger before running session analytics")]
struct Cli {
    /// Path to the ledger CSV (defaults to the configured input)
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Coercion failures and cleaning report
    Report,

    /// Per-session row counts, time range and trader counts
    Coverage {
        /// Only show this session
        #[arg(short, long)]
        session_id: Option<String>,
    },

    /// Full inspection as JSON
    Proof {
        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct LedgerProof {
    input: PathBuf,
    load: LoadAudit,
    cleaning: CleaningReport,
    sessions: Vec<SessionCoverage>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let input = match cli.input {
        Some(path) => path,
        None => RunConfig::from_env()?.input,
    };

    let ledger = TransactionLoader::from_path(&input)
        .with_context(|| format!("Failed to load ledger: {:?}", input))?;

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║              TRANSACTION LEDGER INSPECTION TOOL                ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Ledger: {:?}", input);
    println!();

    let cleaning = CleaningReport::from_transactions(&ledger.transactions);
    let sessions: Vec<SessionCoverage> = SessionPartitioner::new(false)
        .partition(ledger.transactions)
        .sessions
        .iter()
        .map(|session| session.coverage())
        .collect();

    match cli.command {
        Commands::Report => show_report(&ledger.audit, &cleaning, sessions.len()),
        Commands::Coverage { session_id } => show_coverage(&sessions, session_id.as_deref()),
        Commands::Proof { output } => {
            let proof = LedgerProof {
                input,
                load: ledger.audit,
                cleaning,
                sessions,
            };
            generate_proof(&proof, output)?;
        }
    }

    Ok(())
}

fn show_report(audit: &LoadAudit, cleaning: &CleaningReport, sessions: usize) {
    println!("=== Load ===\n");
    println!("  Rows read:                 {}", audit.rows_read);
    println!("  Unparsable timestamps:     {}", audit.unparsable_timestamp);
    println!("  Unparsable prices:         {}", audit.unparsable_price);
    println!("  Unparsable quantities:     {}", audit.unparsable_quantity);
    println!();

    println!("=== Cleaning ===\n");
    println!("  Transactions:              {}", cleaning.tx_count);
    println!("  Sessions:                  {}", sessions);
    println!("  Missing timestamp:         {}", cleaning.missing_timestamp);
    println!("  Missing price:             {}", cleaning.missing_price);
    println!("  Missing quantity:          {}", cleaning.missing_quantity);
    println!("  Duplicate transaction ids: {}", cleaning.duplicate_transaction_ids);
    println!("  Self-trades:               {}", cleaning.self_trade_count);
    match cleaning.self_trade_rate {
        Some(rate) => println!("  Self-trade rate:           {:.4}", rate),
        None => println!("  Self-trade rate:           n/a"),
    }

    if cleaning.duplicate_transaction_ids > 0 {
        println!("\n  ⚠️  Duplicate transaction ids found; every row is still analyzed");
    }
}

fn format_ts(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

fn show_coverage(sessions: &[SessionCoverage], session_id: Option<&str>) {
    println!("=== Session Coverage ===\n");
    println!(
        "  {:>36} {:>8} {:>8} {:>22} {:>22} {:>8}",
        "Session", "Rows", "Timed", "First", "Last", "Traders"
    );
    println!("  {}", "-".repeat(110));

    for coverage in sessions
        .iter()
        .filter(|c| session_id.map_or(true, |id| c.session_id == id))
    {
        let short_id = if coverage.session_id.chars().count() > 36 {
            format!("{}...", coverage.session_id.chars().take(33).collect::<String>())
        } else {
            coverage.session_id.clone()
        };
        println!(
            "  {:>36} {:>8} {:>8} {:>22} {:>22} {:>8}",
            short_id,
            coverage.rows,
            coverage.timestamped,
            format_ts(coverage.first),
            format_ts(coverage.last),
            coverage.traders
        );
    }

    let single_trade = sessions.iter().filter(|c| c.timestamped < 2).count();
    if single_trade > 0 {
        println!(
            "\n  ⚠️  {} session(s) with fewer than two timestamped trades have no returns",
            single_trade
        );
    }
}

fn generate_proof(proof: &LedgerProof, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(proof).context("Failed to serialize proof")?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write proof: {:?}", path))?;
            println!("Proof written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
