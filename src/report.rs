//! Session-level dataset for the reporter
//!
//! Inner join of `volatility_by_session` and `feedback_by_session` on
//! `session_id`. Sessions present in only one table are dropped.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::models::{FeedbackSessionSummary, SessionLevelRow, VolatilitySummary};

/// Below this many sessions any cross-session comparison is unreliable.
pub const MIN_SESSIONS_FOR_COMPARISON: usize = 3;

/// Rows follow the order of `volatility`.
pub fn session_level_dataset(
    volatility: &[VolatilitySummary],
    feedback: &[FeedbackSessionSummary],
) -> Vec<SessionLevelRow> {
    let by_session: HashMap<&str, &FeedbackSessionSummary> = feedback
        .iter()
        .map(|f| (f.session_id.as_str(), f))
        .collect();

    let rows: Vec<SessionLevelRow> = volatility
        .iter()
        .filter_map(|v| {
            let f = by_session.get(v.session_id.as_str())?;
            Some(SessionLevelRow {
                session_id: v.session_id.clone(),
                n_trades: v.n_trades,
                price_first: v.price_first,
                price_last: v.price_last,
                realized_vol_logret: v.realized_vol_logret,
                realized_vol_ret: v.realized_vol_ret,
                n_events: f.n_events,
                feedback_rate: f.feedback_rate,
            })
        })
        .collect();

    let joined: HashSet<&str> = rows.iter().map(|r| r.session_id.as_str()).collect();
    let dropped = volatility
        .iter()
        .map(|v| v.session_id.as_str())
        .chain(feedback.iter().map(|f| f.session_id.as_str()))
        .filter(|id| !joined.contains(id))
        .count();
    if dropped > 0 {
        debug!(dropped, "one-sided sessions left out of session dataset");
    }
    if rows.len() < MIN_SESSIONS_FOR_COMPARISON {
        warn!(
            sessions = rows.len(),
            minimum = MIN_SESSIONS_FOR_COMPARISON,
            "⚠️ session dataset too small for cross-session comparison"
        );
    }

    rows
}
