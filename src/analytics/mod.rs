//! Session-scoped analytics
//!
//! `partition` fixes the session order, `returns` derives the shared price
//! differences, and `inventory`, `volatility` and `feedback` build the result
//! tables. `pipeline` runs them per session.

pub mod feedback;
pub mod inventory;
pub mod partition;
pub mod pipeline;
pub mod returns;
pub mod stats;
pub mod volatility;

pub use feedback::FeedbackClassifier;
pub use inventory::InventoryReconstructor;
pub use partition::{PartitionedLedger, Session, SessionCoverage, SessionPartitioner};
pub use pipeline::{AnalysisEngine, AnalysisReport, RunAudit};
pub use returns::{ReturnSeries, ReturnSeriesBuilder};
pub use volatility::{VolatilityEngine, DEFAULT_WINDOW_SIZE};
