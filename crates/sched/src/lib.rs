//! Point-in-time job scheduling with idempotent run-state tracking.
//!
//! This crate provides:
//! - YAML job descriptors (audit and template report jobs)
//! - A JSON run-state store persisted between invocations
//! - Pure, clock-injected due computation (daily / weekly / monthly)
//! - A strictly sequential runner with stage-aware failure reporting
//!
//! There is no background loop: an invocation loads the persisted state,
//! runs whatever is due, records each outcome, and exits.

pub mod job;
pub mod runner;
pub mod state;
pub mod tracker;

pub use job::{load_schedule, Frequency, Job, JobKind, JobSchedule};
pub use runner::{JobRunResult, Runner};
pub use state::{JobState, Outcome, RunState, RunStatus, StateStore};
pub use tracker::{is_due, list_jobs, next_eligible, JobListing, JobPhase};

use thiserror::Error;

/// Errors from schedule loading, state persistence, or job execution.
#[derive(Debug, Error)]
pub enum SchedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schedule config error: {0}")]
    Config(String),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Corrupted or unreadable run-state. Fatal for the invocation; a
    /// half-readable state file is never partially trusted.
    #[error("run-state error: {0}")]
    State(String),
}
