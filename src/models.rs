//! Ledger and result records shared by every analytics stage.
//!
//! Undefined statistics are `None` throughout; they serialize as an empty
//! CSV cell or SQL `NULL`, never as a zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed trade as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub session_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub buyer_id: String,
    pub seller_id: String,
}

impl Transaction {
    pub fn is_self_trade(&self) -> bool {
        self.buyer_id == self.seller_id
    }

    /// Buyer and seller legs, or `None` when the quantity is undefined.
    pub fn legs(&self) -> Option<[TradeLeg<'_>; 2]> {
        let quantity = self.quantity?;
        Some([
            TradeLeg {
                session_id: &self.session_id,
                transaction_id: &self.transaction_id,
                trader_id: &self.buyer_id,
                side: Side::Buyer,
                signed_quantity: quantity,
            },
            TradeLeg {
                session_id: &self.session_id,
                transaction_id: &self.transaction_id,
                trader_id: &self.seller_id,
                side: Side::Seller,
                signed_quantity: -quantity,
            },
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buyer,
    Seller,
}

/// One side of a transaction as a signed inventory contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLeg<'a> {
    pub session_id: &'a str,
    pub transaction_id: &'a str,
    pub trader_id: &'a str,
    pub side: Side,
    pub signed_quantity: f64,
}

/// Net position of one trader within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub session_id: String,
    pub trader_id: String,
    pub net_inventory: f64,
}

/// A transaction enriched with its return and rolling volatility values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub session_id: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub quantity: Option<f64>,
    pub buyer_id: String,
    pub seller_id: String,
    pub log_price: Option<f64>,
    pub log_return: Option<f64>,
    pub simple_return: Option<f64>,
    pub price_change: Option<f64>,
    pub rolling_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySummary {
    pub session_id: String,
    pub n_trades: usize,
    pub price_first: f64,
    pub price_last: f64,
    pub realized_vol_logret: Option<f64>,
    pub realized_vol_ret: Option<f64>,
}

/// One trader leg following a defined price change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub session_id: String,
    pub transaction_id: String,
    pub trader_id: String,
    pub price_change: f64,
    pub signed_quantity: f64,
    pub is_feedback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTraderSummary {
    pub session_id: String,
    pub trader_id: String,
    pub n_trades: usize,
    pub feedback_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSessionSummary {
    pub session_id: String,
    pub n_events: usize,
    pub feedback_rate: Option<f64>,
}

/// Row of the session-level dataset handed to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLevelRow {
    pub session_id: String,
    pub n_trades: usize,
    pub price_first: f64,
    pub price_last: f64,
    pub realized_vol_logret: Option<f64>,
    pub realized_vol_ret: Option<f64>,
    pub n_events: usize,
    pub feedback_rate: Option<f64>,
}

/// Mean of a boolean indicator, undefined for an empty group.
pub(crate) fn rate(hits: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(hits as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(buyer: &str, seller: &str, quantity: Option<f64>) -> Transaction {
        Transaction {
            transaction_id: "t1".to_string(),
            session_id: "s1".to_string(),
            timestamp: None,
            price: Some(100.0),
            quantity,
            buyer_id: buyer.to_string(),
            seller_id: seller.to_string(),
        }
    }

    #[test]
    fn test_legs_sum_to_zero() {
        for q in [5.0, 0.0, 3.25, 1e9, -2.0] {
            let t = tx("A", "B", Some(q));
            let [buy, sell] = t.legs().expect("legs");
            assert_eq!(buy.signed_quantity + sell.signed_quantity, 0.0);
            assert_eq!(buy.side, Side::Buyer);
            assert_eq!(buy.trader_id, "A");
            assert_eq!(sell.side, Side::Seller);
            assert_eq!(sell.trader_id, "B");
        }
    }

    #[test]
    fn test_undefined_quantity_has_no_legs() {
        assert!(tx("A", "B", None).legs().is_none());
    }

    #[test]
    fn test_self_trade_detection() {
        assert!(tx("A", "A", Some(1.0)).is_self_trade());
        assert!(!tx("A", "B", Some(1.0)).is_self_trade());
    }

    #[test]
    fn test_rate_empty_group_is_undefined() {
        assert_eq!(rate(0, 0), None);
        assert_eq!(rate(1, 4), Some(0.25));
    }
}
