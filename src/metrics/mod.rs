//! Return statistics and batch summaries for wealthmc.

pub mod estimator;
pub mod summary;

pub use estimator::{estimate, estimate_for, AssetMetrics, MarketParameters};
pub use summary::{summarize, BatchSummary, ColumnStats};
