//! `schedule` subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;

use baseops_core::SystemClock;
use baseops_sched::{list_jobs, load_schedule, RunStatus, Runner, StateStore};

use crate::remote;

pub async fn run(
    app: Option<&str>,
    schedule: &Path,
    job: Option<&str>,
    state: &Path,
    json: bool,
) -> Result<()> {
    let jobs = load_schedule(schedule)?;
    let store = StateStore::new(state);

    let mut runner = Runner::new(Arc::new(SystemClock));
    // Remote collaborators are optional: demo-only schedules run without
    // credentials; jobs that need a missing collaborator fail per-job
    // with a stage error instead of blocking the whole pass.
    if let Ok(bitable) = remote::bitable(app) {
        runner = runner.with_source(Arc::new(bitable));
    }
    if let Ok(docs) = remote::docs(None) {
        runner = runner.with_publisher(Arc::new(docs));
    }

    let results = runner.run_due(&jobs, &store, job).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("no jobs due");
    } else {
        for result in &results {
            match result.status {
                RunStatus::Success => {
                    let target = result
                        .document_url
                        .as_deref()
                        .or(result.local_path.as_ref().and_then(|p| p.to_str()))
                        .unwrap_or("-");
                    println!(
                        "ok     {} ({:.1}s) -> {}",
                        result.job_id, result.elapsed_secs, target
                    );
                }
                RunStatus::Failure => {
                    println!(
                        "FAILED {} ({:.1}s): {} [completed stages: {}]",
                        result.job_id,
                        result.elapsed_secs,
                        result.error.as_deref().unwrap_or("unknown error"),
                        result.stages.join(", ")
                    );
                }
            }
        }
    }

    let failed = results
        .iter()
        .filter(|r| r.status == RunStatus::Failure)
        .count();
    if failed > 0 {
        bail!("{failed} job(s) failed");
    }
    Ok(())
}

pub fn list(schedule: &Path, state: &Path) -> Result<()> {
    let jobs = load_schedule(schedule)?;
    let run_state = StateStore::new(state).load()?;
    let listings = list_jobs(&jobs, &run_state, Utc::now())?;

    println!("{} job(s) in {}", listings.len(), schedule.display());
    for listing in listings {
        let flag = if listing.enabled { "enabled " } else { "disabled" };
        let due = if listing.due_now { " [due]" } else { "" };
        println!("  {} {} ({}){}", flag, listing.id, listing.kind, due);
        match listing.next_eligible {
            Some(next) => println!("    next eligible: {}", next.format("%Y-%m-%d %H:%M UTC")),
            None => println!("    next eligible: -"),
        }
        match listing.last_outcome {
            Some(outcome) => {
                let status = match outcome.status {
                    RunStatus::Success => "success",
                    RunStatus::Failure => "failure",
                };
                println!(
                    "    last run: {} at {}{}",
                    status,
                    outcome.finished_at.format("%Y-%m-%d %H:%M UTC"),
                    outcome
                        .error
                        .map(|e| format!(" ({e})"))
                        .unwrap_or_default()
                );
            }
            None => println!("    last run: never"),
        }
    }
    Ok(())
}

pub fn status(state: &Path) -> Result<()> {
    let run_state = StateStore::new(state).load()?;
    if run_state.is_empty() {
        println!("no runs recorded yet");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&run_state)?);
    Ok(())
}
