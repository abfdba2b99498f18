//! Analysis engine
//!
//! Partition once, analyze every session independently on the rayon pool,
//! then flatten the per-session results back in session order.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::feedback::{FeedbackClassifier, SessionFeedback};
use crate::analytics::inventory::InventoryReconstructor;
use crate::analytics::partition::{Session, SessionPartitioner};
use crate::analytics::returns::ReturnSeriesBuilder;
use crate::analytics::volatility::{SessionVolatility, VolatilityEngine};
use crate::config::AnalysisConfig;
use crate::models::{
    FeedbackSessionSummary, FeedbackTraderSummary, InventoryRecord, PricePoint, SessionLevelRow,
    TradeEvent, Transaction, VolatilitySummary,
};
use crate::report;

/// Rows excluded from each stage, by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAudit {
    pub input_rows: usize,
    pub self_trades_removed: usize,
    /// Excluded from returns, volatility and feedback
    pub missing_timestamp: usize,
    /// Timestamped but unpriced; excluded from returns, volatility and feedback
    pub missing_price: usize,
    /// Kept in the series, excluded from log-return statistics
    pub non_positive_price: usize,
    /// Excluded from inventory and feedback
    pub missing_quantity: usize,
    pub sessions: usize,
    pub sessions_with_prices: usize,
}

impl RunAudit {
    pub fn log(&self) {
        info!(
            input_rows = self.input_rows,
            self_trades_removed = self.self_trades_removed,
            missing_timestamp = self.missing_timestamp,
            missing_price = self.missing_price,
            non_positive_price = self.non_positive_price,
            missing_quantity = self.missing_quantity,
            sessions = self.sessions,
            sessions_with_prices = self.sessions_with_prices,
            "🧾 run audit"
        );
    }
}

/// Every output table of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub audit: RunAudit,
    pub inventory: Vec<InventoryRecord>,
    pub transactions: Vec<PricePoint>,
    pub volatility: Vec<VolatilitySummary>,
    pub events: Vec<TradeEvent>,
    pub feedback_by_trader: Vec<FeedbackTraderSummary>,
    pub feedback_by_session: Vec<FeedbackSessionSummary>,
    pub session_level: Vec<SessionLevelRow>,
}

/// Results of a single session before flattening.
struct SessionResult {
    inventory: Vec<InventoryRecord>,
    volatility: SessionVolatility,
    feedback: Option<SessionFeedback>,
    untimestamped: usize,
    unpriced: usize,
    non_positive_price: usize,
    missing_quantity: usize,
}

pub struct AnalysisEngine {
    config: AnalysisConfig,
    partitioner: SessionPartitioner,
    volatility: VolatilityEngine,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            partitioner: SessionPartitioner::new(config.exclude_self_trades),
            volatility: VolatilityEngine::new(config.window_size),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, ledger: Vec<Transaction>) -> AnalysisReport {
        let start = Instant::now();
        let input_rows = ledger.len();

        info!(
            rows = input_rows,
            window_size = self.config.window_size,
            exclude_self_trades = self.config.exclude_self_trades,
            "⚙️ analyzing ledger"
        );

        let partitioned = self.partitioner.partition(ledger);

        // Indexed collect keeps session order
        let results: Vec<SessionResult> = partitioned
            .sessions
            .par_iter()
            .map(|session| self.analyze_session(session))
            .collect();

        let mut report = AnalysisReport {
            config: self.config.clone(),
            audit: RunAudit {
                input_rows,
                self_trades_removed: partitioned.self_trades_removed,
                sessions: partitioned.sessions.len(),
                ..RunAudit::default()
            },
            ..AnalysisReport::default()
        };

        for result in results {
            let audit = &mut report.audit;
            audit.missing_timestamp += result.untimestamped;
            audit.missing_price += result.unpriced;
            audit.non_positive_price += result.non_positive_price;
            audit.missing_quantity += result.missing_quantity;

            report.inventory.extend(result.inventory);
            report.transactions.extend(result.volatility.points);
            if let Some(summary) = result.volatility.summary {
                audit.sessions_with_prices += 1;
                report.volatility.push(summary);
            }
            if let Some(feedback) = result.feedback {
                report.events.extend(feedback.events);
                report.feedback_by_trader.extend(feedback.by_trader);
                report.feedback_by_session.push(feedback.summary);
            }
        }

        report.session_level =
            report::session_level_dataset(&report.volatility, &report.feedback_by_session);

        report.audit.log();
        if report.audit.non_positive_price > 0 {
            warn!(
                rows = report.audit.non_positive_price,
                "non-positive prices excluded from log returns"
            );
        }
        info!(
            inventory = report.inventory.len(),
            transactions = report.transactions.len(),
            volatility = report.volatility.len(),
            events = report.events.len(),
            feedback_by_trader = report.feedback_by_trader.len(),
            feedback_by_session = report.feedback_by_session.len(),
            session_level = report.session_level.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "✅ analysis complete"
        );

        report
    }

    fn analyze_session(&self, session: &Session) -> SessionResult {
        let inventory = InventoryReconstructor.reconstruct(session);
        let series = ReturnSeriesBuilder.build(session);
        let volatility = self.volatility.analyze(&series);
        let feedback = (!series.is_empty()).then(|| FeedbackClassifier.analyze(&series));

        debug!(
            session_id = %session.session_id,
            transactions = session.transactions.len(),
            priced = series.len(),
            traders = inventory.len(),
            "session analyzed"
        );

        SessionResult {
            inventory,
            untimestamped: session.untimestamped(),
            unpriced: series.unpriced,
            non_positive_price: series.non_positive_prices(),
            missing_quantity: InventoryReconstructor.excluded(session),
            volatility,
            feedback,
        }
    }
}
