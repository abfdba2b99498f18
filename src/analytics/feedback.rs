//! Feedback-trading proxy
//!
//! Every leg of a transaction that follows a defined price change becomes a
//! trade event. An event is feedback when it buys after an uptick or sells
//! after a downtick; a flat price change is never feedback.

use std::collections::BTreeMap;

use crate::analytics::returns::ReturnSeries;
use crate::models::{rate, FeedbackSessionSummary, FeedbackTraderSummary, TradeEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionFeedback {
    pub events: Vec<TradeEvent>,
    pub by_trader: Vec<FeedbackTraderSummary>,
    pub summary: FeedbackSessionSummary,
    /// Transactions with a price change but no quantity
    pub unquantified: usize,
}

#[inline]
pub fn is_feedback(price_change: f64, signed_quantity: f64) -> bool {
    (price_change > 0.0 && signed_quantity > 0.0) || (price_change < 0.0 && signed_quantity < 0.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackClassifier;

impl FeedbackClassifier {
    /// Buyer then seller event per transaction, in session order.
    pub fn events(&self, series: &ReturnSeries<'_>) -> Vec<TradeEvent> {
        let mut events = Vec::with_capacity(series.len() * 2);

        for point in &series.points {
            let Some(price_change) = point.price_change else {
                continue;
            };
            let Some(legs) = point.transaction.legs() else {
                continue;
            };

            events.extend(legs.into_iter().map(|leg| TradeEvent {
                session_id: leg.session_id.to_string(),
                transaction_id: leg.transaction_id.to_string(),
                trader_id: leg.trader_id.to_string(),
                price_change,
                signed_quantity: leg.signed_quantity,
                is_feedback: is_feedback(price_change, leg.signed_quantity),
            }));
        }

        events
    }

    pub fn analyze(&self, series: &ReturnSeries<'_>) -> SessionFeedback {
        let events = self.events(series);

        // Every trader of the ordered series gets a row, even without events
        let mut per_trader: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for point in &series.points {
            if let Some(legs) = point.transaction.legs() {
                for leg in legs {
                    per_trader.entry(leg.trader_id).or_default();
                }
            }
        }
        for event in &events {
            let entry = per_trader.entry(event.trader_id.as_str()).or_default();
            entry.0 += 1;
            entry.1 += usize::from(event.is_feedback);
        }

        let by_trader = per_trader
            .into_iter()
            .map(|(trader_id, (n_trades, hits))| FeedbackTraderSummary {
                session_id: series.session_id.to_string(),
                trader_id: trader_id.to_string(),
                n_trades,
                feedback_rate: rate(hits, n_trades),
            })
            .collect();

        let hits = events.iter().filter(|e| e.is_feedback).count();
        let summary = FeedbackSessionSummary {
            session_id: series.session_id.to_string(),
            n_events: events.len(),
            feedback_rate: rate(hits, events.len()),
        };

        let unquantified = series
            .points
            .iter()
            .filter(|p| p.price_change.is_some() && p.transaction.quantity.is_none())
            .count();

        SessionFeedback {
            events,
            by_trader,
            summary,
            unquantified,
        }
    }
}
