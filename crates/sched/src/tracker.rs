//! Due computation and job listing.
//!
//! Pure functions of (schedule, last-success timestamp, now) — the clock
//! is injected by the caller, so the frequency invariants are testable
//! without real time passage.
//!
//! Invariants:
//! - `daily`: at most one successful run per calendar day
//! - `weekly`: at most one per ISO week, on the configured weekday
//! - `monthly`: at most one per calendar month, on the configured day

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::job::{Frequency, Job, JobSchedule};
use crate::state::{Outcome, RunState};
use crate::SchedError;

/// Lifecycle of a job within one scheduler pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Due,
    Running,
    Completed(crate::state::RunStatus),
}

/// Whether a job is due at `now`, given its last successful run.
///
/// A failed run does not advance `last_success`, so a job that failed
/// earlier today is still due.
pub fn is_due(
    schedule: &JobSchedule,
    last_success: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, SchedError> {
    let time = schedule.time_of_day()?;
    let today_at = now
        .date_naive()
        .and_time(time)
        .and_utc();

    match schedule.frequency {
        Frequency::Daily => {
            if now < today_at {
                return Ok(false);
            }
            Ok(!already_ran_today(last_success, now))
        }
        Frequency::Weekly => {
            if now.weekday().number_from_monday() != schedule.day_of_week || now < today_at {
                return Ok(false);
            }
            Ok(!already_ran_this_iso_week(last_success, now))
        }
        Frequency::Monthly => {
            if now.day() != schedule.day_of_month || now < today_at {
                return Ok(false);
            }
            Ok(!already_ran_this_month(last_success, now))
        }
    }
}

fn already_ran_today(last_success: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_success.is_some_and(|last| last.date_naive() == now.date_naive())
}

fn already_ran_this_iso_week(last_success: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_success.is_some_and(|last| last.iso_week() == now.iso_week())
}

fn already_ran_this_month(last_success: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_success.is_some_and(|last| last.year() == now.year() && last.month() == now.month())
}

/// Next instant at which the job becomes eligible, computed (not stored).
///
/// Returns `now` when the job is due right now. `None` only for
/// unsatisfiable schedules (e.g. `day_of_month: 31` scanning past a year).
pub fn next_eligible(
    schedule: &JobSchedule,
    last_success: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedError> {
    if is_due(schedule, last_success, now)? {
        return Ok(Some(now));
    }

    let time = schedule.time_of_day()?;
    for days_ahead in 0..=366 {
        let date = now.date_naive() + Duration::days(days_ahead);
        let candidate = date.and_time(time).and_utc();
        if candidate < now {
            continue;
        }
        let eligible = match schedule.frequency {
            Frequency::Daily => !already_ran_today(last_success, candidate),
            Frequency::Weekly => {
                candidate.weekday().number_from_monday() == schedule.day_of_week
                    && !already_ran_this_iso_week(last_success, candidate)
            }
            Frequency::Monthly => {
                candidate.day() == schedule.day_of_month
                    && !already_ran_this_month(last_success, candidate)
            }
        };
        if eligible {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// One row of `schedule list` output.
#[derive(Debug, Serialize)]
pub struct JobListing {
    pub id: String,
    pub name: String,
    pub kind: &'static str,
    pub enabled: bool,
    pub due_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_eligible: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<Outcome>,
}

/// Compute the listing for every job against the loaded state.
pub fn list_jobs(
    jobs: &[Job],
    state: &RunState,
    now: DateTime<Utc>,
) -> Result<Vec<JobListing>, SchedError> {
    jobs.iter()
        .map(|job| {
            let job_state = state.get(&job.id);
            let last_success = job_state.and_then(|s| s.last_success);
            let due_now = job.enabled && is_due(&job.schedule, last_success, now)?;
            Ok(JobListing {
                id: job.id.clone(),
                name: job.name.clone(),
                kind: job.kind.name(),
                enabled: job.enabled,
                due_now,
                next_eligible: if job.enabled {
                    next_eligible(&job.schedule, last_success, now)?
                } else {
                    None
                },
                last_outcome: job_state.and_then(|s| s.last_outcome.clone()),
            })
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
