//! YAML-configured operational audit engine.
//!
//! This crate provides:
//! - Rule configuration with per-industry thresholds and field mapping
//! - A static registry of pure rule checkers (one finding max per rule
//!   per store)
//! - Per-store health scoring and severity-ordered findings
//! - Markdown report rendering
//! - A seeded demo data generator

pub mod checkers;
pub mod demo;
pub mod engine;
pub mod report;
pub mod schema;

pub use demo::demo_stores;
pub use engine::{evaluate_store, run_audit, AuditContext, AuditReport, Finding};
pub use report::render_markdown;
pub use schema::{AuditConfig, RuleConfig, Severity};

use thiserror::Error;

/// Errors from loading or applying audit configuration.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}
