//! Output table layouts
//!
//! Each result record knows its table name, column layout and SQL values.
//! CSV rendering goes through serde, so column order follows field order.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rusqlite::types::Value;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{
    FeedbackSessionSummary, FeedbackTraderSummary, InventoryRecord, PricePoint, SessionLevelRow,
    TradeEvent, VolatilitySummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        nullable: false,
    }
}

const fn nullable(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        nullable: true,
    }
}

use ColumnKind::{Integer, Real, Text};

pub trait Table: Serialize {
    const NAME: &'static str;
    const COLUMNS: &'static [Column];

    /// One value per entry of `COLUMNS`, in the same order.
    fn sql_values(&self) -> Vec<Value>;
}

fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn count(value: usize) -> Value {
    Value::Integer(value as i64)
}

impl Table for InventoryRecord {
    const NAME: &'static str = "inventory_by_session_trader";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("trader_id", Text),
        col("net_inventory", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            text(&self.trader_id),
            Value::Real(self.net_inventory),
        ]
    }
}

impl Table for PricePoint {
    const NAME: &'static str = "transactions_with_volatility";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("transaction_id", Text),
        col("timestamp", Text),
        col("price", Real),
        nullable("quantity", Real),
        col("buyer_id", Text),
        col("seller_id", Text),
        nullable("log_price", Real),
        nullable("log_return", Real),
        nullable("simple_return", Real),
        nullable("price_change", Real),
        nullable("rolling_volatility", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            text(&self.transaction_id),
            Value::Text(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Real(self.price),
            real(self.quantity),
            text(&self.buyer_id),
            text(&self.seller_id),
            real(self.log_price),
            real(self.log_return),
            real(self.simple_return),
            real(self.price_change),
            real(self.rolling_volatility),
        ]
    }
}

impl Table for VolatilitySummary {
    const NAME: &'static str = "volatility_by_session";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("n_trades", Integer),
        col("price_first", Real),
        col("price_last", Real),
        nullable("realized_vol_logret", Real),
        nullable("realized_vol_ret", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            count(self.n_trades),
            Value::Real(self.price_first),
            Value::Real(self.price_last),
            real(self.realized_vol_logret),
            real(self.realized_vol_ret),
        ]
    }
}

impl Table for TradeEvent {
    const NAME: &'static str = "feedback_events";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("transaction_id", Text),
        col("trader_id", Text),
        col("price_change", Real),
        col("signed_quantity", Real),
        col("is_feedback", Integer),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            text(&self.transaction_id),
            text(&self.trader_id),
            Value::Real(self.price_change),
            Value::Real(self.signed_quantity),
            Value::Integer(i64::from(self.is_feedback)),
        ]
    }
}

impl Table for FeedbackTraderSummary {
    const NAME: &'static str = "feedback_by_session_trader";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("trader_id", Text),
        col("n_trades", Integer),
        nullable("feedback_rate", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            text(&self.trader_id),
            count(self.n_trades),
            real(self.feedback_rate),
        ]
    }
}

impl Table for FeedbackSessionSummary {
    const NAME: &'static str = "feedback_by_session";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("n_events", Integer),
        nullable("feedback_rate", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            count(self.n_events),
            real(self.feedback_rate),
        ]
    }
}

impl Table for SessionLevelRow {
    const NAME: &'static str = "session_level_dataset";
    const COLUMNS: &'static [Column] = &[
        col("session_id", Text),
        col("n_trades", Integer),
        col("price_first", Real),
        col("price_last", Real),
        nullable("realized_vol_logret", Real),
        nullable("realized_vol_ret", Real),
        col("n_events", Integer),
        nullable("feedback_rate", Real),
    ];

    fn sql_values(&self) -> Vec<Value> {
        vec![
            text(&self.session_id),
            count(self.n_trades),
            Value::Real(self.price_first),
            Value::Real(self.price_last),
            real(self.realized_vol_logret),
            real(self.realized_vol_ret),
            count(self.n_events),
            real(self.feedback_rate),
        ]
    }
}

/// A table rendered to CSV bytes.
#[derive(Debug, Clone)]
pub struct RenderedTable {
    pub name: &'static str,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl RenderedTable {
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Header line always present, even for an empty table.
pub fn render_csv<T: Table>(rows: &[T]) -> Result<RenderedTable> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(T::COLUMNS.iter().map(|c| c.name))
        .with_context(|| format!("Failed to write header of {}", T::NAME))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to serialize row of {}", T::NAME))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush {}: {}", T::NAME, e.error()))?;

    Ok(RenderedTable {
        name: T::NAME,
        rows: rows.len(),
        bytes,
    })
}
