//! Inventory reconstruction
//!
//! Net position per (session, trader): buyer legs add the quantity, seller
//! legs subtract it. No time order is involved, so untimestamped
//! transactions count here.

use std::collections::BTreeMap;

use crate::analytics::partition::Session;
use crate::models::InventoryRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryReconstructor;

impl InventoryReconstructor {
    /// Records for one session, traders ascending.
    pub fn reconstruct(&self, session: &Session) -> Vec<InventoryRecord> {
        let mut positions: BTreeMap<&str, f64> = BTreeMap::new();

        for leg in session.transactions.iter().filter_map(|tx| tx.legs()).flatten() {
            *positions.entry(leg.trader_id).or_insert(0.0) += leg.signed_quantity;
        }

        positions
            .into_iter()
            .map(|(trader_id, net_inventory)| InventoryRecord {
                session_id: session.session_id.clone(),
                trader_id: trader_id.to_string(),
                net_inventory,
            })
            .collect()
    }

    /// Transactions dropped for an undefined quantity.
    pub fn excluded(&self, session: &Session) -> usize {
        session
            .transactions
            .iter()
            .filter(|tx| tx.quantity.is_none())
            .count()
    }
}
