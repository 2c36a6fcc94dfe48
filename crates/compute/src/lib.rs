//! Cross-table correlation and per-table summaries.
//!
//! This crate provides:
//! - Left-outer natural-key join across two record sets
//! - Per-field numeric/categorical aggregation summaries
//! - Render-context building for template reports

pub mod context;
pub mod join;
pub mod stats;

pub use context::build_context;
pub use join::{join, project};
pub use stats::{aggregate_stats, FieldKind, FieldSummary, TableSummary};
