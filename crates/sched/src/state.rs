//! Persisted run-state store.
//!
//! One pretty-printed JSON file keyed by job id — small enough to inspect
//! by hand, durable across invocations. The file is read once at the start
//! of a run and rewritten after every job completion, so an interrupted
//! run keeps the outcomes of everything that finished before it.
//!
//! Concurrent scheduler invocations against the same file are NOT safe
//! without external locking; this is a documented limitation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::SchedError;

/// Outcome status of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// Summary of the most recent completed run of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: RunStatus,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-job bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Timestamp of the last *successful* run. Failures never advance
    /// this, so a failed job stays due on the next invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<Outcome>,
}

/// All job states, keyed by job id.
pub type RunState = IndexMap<String, JobState>;

/// Record a successful completion: advances `last_success`.
pub fn record_success(state: &mut RunState, job_id: &str, at: DateTime<Utc>, elapsed_secs: f64) {
    let entry = state.entry(job_id.to_string()).or_default();
    entry.last_success = Some(at);
    entry.last_outcome = Some(Outcome {
        status: RunStatus::Success,
        finished_at: at,
        elapsed_secs,
        error: None,
    });
}

/// Record a failed completion: keeps the prior `last_success` untouched.
pub fn record_failure(
    state: &mut RunState,
    job_id: &str,
    at: DateTime<Utc>,
    elapsed_secs: f64,
    error: String,
) {
    let entry = state.entry(job_id.to_string()).or_default();
    entry.last_outcome = Some(Outcome {
        status: RunStatus::Failure,
        finished_at: at,
        elapsed_secs,
        error: Some(error),
    });
}

/// File-backed state store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state file. A missing file is an empty state; an
    /// unreadable or malformed file is a fatal [`SchedError::State`].
    pub fn load(&self) -> Result<RunState, SchedError> {
        if !self.path.exists() {
            return Ok(RunState::new());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            SchedError::State(format!("cannot read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            SchedError::State(format!("corrupt state file {}: {e}", self.path.display()))
        })
    }

    /// Persist the state file (pretty JSON, parent dirs created).
    pub fn save(&self, state: &RunState) -> Result<(), SchedError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(state)
            .map_err(|e| SchedError::State(format!("cannot serialize state: {e}")))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
