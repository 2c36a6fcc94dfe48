//! Job descriptor schema.
//!
//! A schedule file is a YAML list of jobs. Each job names a frequency and
//! a time of day plus parameters specific to its kind; jobs are read-only
//! once loaded for a run.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use baseops_core::Value;

use crate::SchedError;

/// How often a job becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// When a job becomes due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSchedule {
    pub frequency: Frequency,
    /// 24-hour `HH:MM`.
    #[serde(default = "default_time")]
    pub time: String,
    /// Weekly only: Monday = 1 .. Sunday = 7.
    #[serde(default = "default_day_of_week")]
    pub day_of_week: u32,
    /// Monthly only: day of month (1..=31).
    #[serde(default = "default_day_of_month")]
    pub day_of_month: u32,
}

fn default_time() -> String {
    "09:00".to_string()
}

fn default_day_of_week() -> u32 {
    1
}

fn default_day_of_month() -> u32 {
    1
}

impl JobSchedule {
    /// Parse the `HH:MM` time-of-day.
    pub fn time_of_day(&self) -> Result<NaiveTime, SchedError> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|_| {
            SchedError::Config(format!("invalid schedule time '{}'", self.time))
        })
    }
}

/// Parameters for an audit report job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditJobParams {
    /// Sales table to audit. Not needed when `use_demo` is set.
    #[serde(default)]
    pub table: Option<String>,
    /// Audit rule config file; the bundled default applies when unset.
    #[serde(default)]
    pub config: Option<PathBuf>,
    /// Run against the seeded demo fleet instead of fetching.
    #[serde(default)]
    pub use_demo: bool,
    #[serde(default = "default_demo_count")]
    pub demo_count: usize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publish: bool,
    /// Also write the rendered report to this local path.
    #[serde(default)]
    pub output_local: Option<PathBuf>,
}

fn default_demo_count() -> usize {
    50
}

/// Parameters for a templated report job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateJobParams {
    /// Table whose records feed the template context.
    pub table: String,
    /// Template file (markdown with `{{...}}` markers).
    pub template: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub output_local: Option<PathBuf>,
    /// Extra context entries merged over the generated ones.
    #[serde(default)]
    pub extra_context: Option<IndexMap<String, Value>>,
}

/// Job kind and its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobKind {
    Audit {
        #[serde(default)]
        params: AuditJobParams,
    },
    Template {
        params: TemplateJobParams,
    },
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Audit { .. } => "audit",
            JobKind::Template { .. } => "template",
        }
    }
}

/// A schedulable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Stable identifier; derived from `name` when omitted.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub schedule: JobSchedule,
    #[serde(flatten)]
    pub kind: JobKind,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Load a schedule file, deriving missing job ids from names.
///
/// Duplicate ids are a config error — run-state is keyed by id.
pub fn load_schedule(path: &Path) -> Result<Vec<Job>, SchedError> {
    let text = std::fs::read_to_string(path)?;
    parse_schedule(&text)
}

/// Parse schedule YAML (separated out for tests).
pub fn parse_schedule(text: &str) -> Result<Vec<Job>, SchedError> {
    let file: ScheduleFile = serde_yaml::from_str(text)?;
    let mut jobs = file.jobs;

    for job in &mut jobs {
        if job.id.is_empty() {
            job.id = job.name.to_lowercase().replace(' ', "_");
        }
        job.schedule.time_of_day()?;
    }

    let mut seen = std::collections::HashSet::new();
    for job in &jobs {
        if !seen.insert(job.id.as_str()) {
            return Err(SchedError::Config(format!("duplicate job id '{}'", job.id)));
        }
    }

    Ok(jobs)
}

// ── Tests ───────────────────────────────────────────────────────────
