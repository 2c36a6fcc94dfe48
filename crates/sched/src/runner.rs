//! Sequential job runner.
//!
//! One invocation = one pass over the due jobs, strictly in file order,
//! never concurrently. Each job walks `Due → Running → Completed` and its
//! outcome is persisted before the next job starts, so an interruption
//! loses at most the job that was in flight.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use baseops_audit::engine::AuditContext;
use baseops_audit::{demo_stores, render_markdown, run_audit, AuditConfig};
use baseops_compute::build_context;
use baseops_core::{Clock, DocumentPublisher, Fields, RecordSource};
use baseops_template::Renderer;

use crate::job::{AuditJobParams, Job, JobKind, TemplateJobParams};
use crate::state::{record_failure, record_success, RunStatus, StateStore};
use crate::tracker::{is_due, JobPhase};
use crate::SchedError;

/// Result of one executed job within a pass.
#[derive(Debug, Serialize)]
pub struct JobRunResult {
    pub job_id: String,
    pub name: String,
    pub status: RunStatus,
    pub elapsed_secs: f64,
    /// Pipeline stages that completed, in order. On failure this tells
    /// the operator which side of the job succeeded before the break.
    pub stages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// What a completed job produced.
#[derive(Debug, Default)]
struct Artifacts {
    document_url: Option<String>,
    local_path: Option<PathBuf>,
}

/// Executes due jobs against injected collaborators.
pub struct Runner {
    clock: Arc<dyn Clock>,
    source: Option<Arc<dyn RecordSource>>,
    publisher: Option<Arc<dyn DocumentPublisher>>,
}

impl Runner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            source: None,
            publisher: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn DocumentPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Run every enabled job that is due (or the single job named by
    /// `force`, bypassing the timing checks).
    ///
    /// The state file is loaded once up front and rewritten after each
    /// job completes. A failed job records its failure but does not
    /// advance `last_success`, leaving it due on the next invocation.
    pub async fn run_due(
        &self,
        jobs: &[Job],
        store: &StateStore,
        force: Option<&str>,
    ) -> Result<Vec<JobRunResult>, SchedError> {
        let mut state = store.load()?;
        let mut results = Vec::new();

        for job in jobs {
            if !job.enabled {
                debug!(job_id = %job.id, "job disabled, skipping");
                continue;
            }
            if let Some(forced) = force {
                if job.id != forced {
                    continue;
                }
            }

            let last_success = state.get(&job.id).and_then(|s| s.last_success);
            let now = self.clock.now();
            if force.is_none() && !is_due(&job.schedule, last_success, now)? {
                debug!(job_id = %job.id, phase = ?JobPhase::Idle, "job not due");
                continue;
            }

            info!(job_id = %job.id, kind = job.kind.name(), phase = ?JobPhase::Due, "job selected");
            let started = self.clock.now();
            debug!(job_id = %job.id, phase = ?JobPhase::Running, "executing");
            let mut stages = Vec::new();
            let outcome = self.execute(job, &mut stages).await;
            let finished = self.clock.now();
            let elapsed = (finished - started).num_milliseconds() as f64 / 1000.0;

            let result = match outcome {
                Ok(artifacts) => {
                    record_success(&mut state, &job.id, finished, elapsed);
                    info!(
                        job_id = %job.id,
                        elapsed,
                        phase = ?JobPhase::Completed(RunStatus::Success),
                        "job completed"
                    );
                    JobRunResult {
                        job_id: job.id.clone(),
                        name: job.name.clone(),
                        status: RunStatus::Success,
                        elapsed_secs: elapsed,
                        stages,
                        error: None,
                        document_url: artifacts.document_url,
                        local_path: artifacts.local_path,
                    }
                }
                Err(message) => {
                    record_failure(&mut state, &job.id, finished, elapsed, message.clone());
                    error!(
                        job_id = %job.id,
                        error = %message,
                        phase = ?JobPhase::Completed(RunStatus::Failure),
                        "job failed"
                    );
                    JobRunResult {
                        job_id: job.id.clone(),
                        name: job.name.clone(),
                        status: RunStatus::Failure,
                        elapsed_secs: elapsed,
                        stages,
                        error: Some(message),
                        document_url: None,
                        local_path: None,
                    }
                }
            };
            results.push(result);

            // Persist after every completion so a later crash cannot
            // corrupt what already finished.
            store.save(&state)?;
        }

        Ok(results)
    }

    async fn execute(&self, job: &Job, stages: &mut Vec<String>) -> Result<Artifacts, String> {
        match &job.kind {
            JobKind::Audit { params } => self.execute_audit(params, stages).await,
            JobKind::Template { params } => self.execute_template(params, stages).await,
        }
    }

    async fn execute_audit(
        &self,
        params: &AuditJobParams,
        stages: &mut Vec<String>,
    ) -> Result<Artifacts, String> {
        let config = match &params.config {
            Some(path) => AuditConfig::load(path)
                .map_err(|e| format!("load-config: {e}"))?,
            None => AuditConfig::default_config(),
        };
        stages.push("load-config".to_string());

        let stores: Vec<Fields> = if params.use_demo {
            demo_stores(params.demo_count)
        } else {
            let table = params
                .table
                .as_deref()
                .ok_or("fetch: audit job needs a table (or use_demo)")?;
            let records = self
                .fetch(table)
                .await
                .map_err(|e| format!("fetch: {e}"))?;
            records.into_iter().map(|r| r.fields).collect()
        };
        stages.push("fetch".to_string());

        let report = run_audit(
            &stores,
            &AuditContext::default(),
            &config,
            self.clock.now(),
        );
        stages.push("audit".to_string());

        let body = render_markdown(&report);
        stages.push("render".to_string());

        let title = params.title.clone().unwrap_or_else(|| {
            format!(
                "Store Operations Audit {}",
                report.audit_time.format("%Y-%m-%d")
            )
        });

        self.deliver(&title, &body, params.output_local.as_ref(), params.publish, stages)
            .await
    }

    async fn execute_template(
        &self,
        params: &TemplateJobParams,
        stages: &mut Vec<String>,
    ) -> Result<Artifacts, String> {
        let template_text = std::fs::read_to_string(&params.template)
            .map_err(|e| format!("load-template: {}: {e}", params.template.display()))?;
        stages.push("load-template".to_string());

        let records = self
            .fetch(&params.table)
            .await
            .map_err(|e| format!("fetch: {e}"))?;
        stages.push("fetch".to_string());

        let context = build_context(
            &records,
            params.group_by.as_deref(),
            params.extra_context.as_ref(),
        );
        stages.push("context".to_string());

        let rendered = Renderer::with_clock(self.clock.clone())
            .render(&template_text, &context)
            .map_err(|e| format!("render: {e}"))?;
        stages.push("render".to_string());

        let title = params
            .title
            .clone()
            .or_else(|| extract_title(&rendered))
            .unwrap_or_else(|| {
                format!("Report {}", self.clock.now().format("%Y-%m-%d %H:%M"))
            });

        self.deliver(&title, &rendered, params.output_local.as_ref(), params.publish, stages)
            .await
    }

    async fn fetch(&self, table: &str) -> Result<Vec<baseops_core::Record>, String> {
        let source = self
            .source
            .as_ref()
            .ok_or("no record source configured")?;
        source
            .fetch_all(table)
            .await
            .map_err(|e| e.to_string())
    }

    /// Write the local copy and/or publish. The local write happens first
    /// so a publish failure still leaves the report on disk.
    async fn deliver(
        &self,
        title: &str,
        body: &str,
        output_local: Option<&PathBuf>,
        publish: bool,
        stages: &mut Vec<String>,
    ) -> Result<Artifacts, String> {
        let mut artifacts = Artifacts::default();

        if let Some(path) = output_local {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| format!("write-local: {e}"))?;
                }
            }
            std::fs::write(path, body).map_err(|e| format!("write-local: {e}"))?;
            artifacts.local_path = Some(path.clone());
            stages.push("write-local".to_string());
        }

        if publish {
            let publisher = self
                .publisher
                .as_ref()
                .ok_or("publish: no document publisher configured")?;
            let doc = publisher
                .publish_document(title, body)
                .await
                .map_err(|e| format!("publish: {e}"))?;
            artifacts.document_url = Some(doc.url);
            stages.push("publish".to_string());
        }

        Ok(artifacts)
    }
}

/// Title from the first markdown heading of a rendered report.
fn extract_title(rendered: &str) -> Option<String> {
    let first = rendered.lines().find(|l| !l.trim().is_empty())?;
    let trimmed = first.trim();
    if trimmed.starts_with('#') {
        Some(trimmed.trim_start_matches('#').trim().to_string())
    } else {
        None
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use baseops_core::{
        BaseopsError, DocumentRef, FixedClock, Record, Value,
    };

    use crate::job::{Frequency, JobSchedule};
    use crate::state::StateStore;

    struct FakeSource {
        records: Vec<Record>,
    }

    #[async_trait::async_trait]
    impl RecordSource for FakeSource {
        async fn fetch_all(&self, _table: &str) -> Result<Vec<Record>, BaseopsError> {
            Ok(self.records.clone())
        }
    }

    struct FakePublisher {
        fail: bool,
        published: Mutex<Vec<(String, String)>>,
    }

    impl FakePublisher {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl DocumentPublisher for FakePublisher {
        async fn publish_document(
            &self,
            title: &str,
            body: &str,
        ) -> Result<DocumentRef, BaseopsError> {
            if self.fail {
                return Err(BaseopsError::Remote("503 from platform".to_string()));
            }
            self.published
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(DocumentRef {
                token: "doc123".to_string(),
                url: "https://docs.example/doc123".to_string(),
                title: title.to_string(),
            })
        }
    }

    fn demo_audit_job(id: &str, publish: bool) -> Job {
        Job {
            id: id.to_string(),
            name: format!("Job {id}"),
            enabled: true,
            schedule: JobSchedule {
                frequency: Frequency::Daily,
                time: "09:00".to_string(),
                day_of_week: 1,
                day_of_month: 1,
            },
            kind: JobKind::Audit {
                params: AuditJobParams {
                    use_demo: true,
                    demo_count: 10,
                    publish,
                    ..Default::default()
                },
            },
        }
    }

    fn clock_at(rfc3339: &str) -> Arc<dyn Clock> {
        Arc::new(FixedClock::at(rfc3339))
    }

    fn temp_store(dir: &tempfile::TempDir) -> StateStore {
        StateStore::new(dir.path().join("state.json"))
    }

    #[tokio::test]
    async fn due_job_runs_once_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"));
        let jobs = vec![demo_audit_job("daily_audit", false)];

        let results = runner.run_due(&jobs, &store, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, RunStatus::Success);

        // Same day, later hour: the job is no longer due.
        let later = Runner::new(clock_at("2026-08-05T15:00:00Z"));
        let again = later.run_due(&jobs, &store, None).await.unwrap();
        assert!(again.is_empty());

        // Next day it runs again.
        let tomorrow = Runner::new(clock_at("2026-08-06T09:30:00Z"));
        let next = tomorrow.run_due(&jobs, &store, None).await.unwrap();
        assert_eq!(next.len(), 1);
    }

    #[tokio::test]
    async fn not_due_before_scheduled_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let runner = Runner::new(clock_at("2026-08-05T08:00:00Z"));
        let jobs = vec![demo_audit_job("daily_audit", false)];

        let results = runner.run_due(&jobs, &store, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn force_bypasses_timing_but_records_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let jobs = vec![demo_audit_job("daily_audit", false)];

        // 08:00 — before the scheduled time, but forced.
        let runner = Runner::new(clock_at("2026-08-05T08:00:00Z"));
        let results = runner
            .run_due(&jobs, &store, Some("daily_audit"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        let state = store.load().unwrap();
        assert!(state["daily_audit"].last_success.is_some());
    }

    #[tokio::test]
    async fn disabled_job_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let mut job = demo_audit_job("daily_audit", false);
        job.enabled = false;

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"));
        let results = runner.run_due(&[job], &store, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn publish_failure_reports_stage_and_keeps_job_due() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let local = dir.path().join("report.md");

        let mut job = demo_audit_job("daily_audit", true);
        if let JobKind::Audit { params } = &mut job.kind {
            params.output_local = Some(local.clone());
        }

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"))
            .with_publisher(Arc::new(FakePublisher::new(true)));
        let results = runner.run_due(&[job.clone()], &store, None).await.unwrap();

        let result = &results[0];
        assert_eq!(result.status, RunStatus::Failure);
        // The error names the failed side; the stages name what worked.
        assert!(result.error.as_ref().unwrap().starts_with("publish:"));
        assert!(result.stages.contains(&"write-local".to_string()));
        assert!(local.exists(), "local copy written before publish attempt");

        // Failure did not advance last_success: still due today.
        let state = store.load().unwrap();
        assert!(state["daily_audit"].last_success.is_none());
        let retry = Runner::new(clock_at("2026-08-05T10:00:00Z"))
            .with_publisher(Arc::new(FakePublisher::new(false)));
        let retried = retry.run_due(&[job], &store, None).await.unwrap();
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].status, RunStatus::Success);
    }

    #[tokio::test]
    async fn successful_publish_returns_document_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let publisher = Arc::new(FakePublisher::new(false));

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"))
            .with_publisher(publisher.clone());
        let results = runner
            .run_due(&[demo_audit_job("daily_audit", true)], &store, None)
            .await
            .unwrap();

        assert_eq!(
            results[0].document_url.as_deref(),
            Some("https://docs.example/doc123")
        );
        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert!(published[0].0.contains("2026-08-05"));
    }

    #[tokio::test]
    async fn template_job_renders_fetched_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        let template_path = dir.path().join("report.md");
        std::fs::write(
            &template_path,
            "# Sales {{TODAY}}\n{{#each records}}- {{this.name}}: {{this.amount}}\n{{/each}}Total: {{summary.amount_sum}}\n",
        )
        .unwrap();
        let output_path = dir.path().join("out.md");

        let records = vec![
            Record::new(
                [
                    ("name".to_string(), Value::String("North".into())),
                    ("amount".to_string(), Value::Number(10.0)),
                ]
                .into_iter()
                .collect(),
            ),
            Record::new(
                [
                    ("name".to_string(), Value::String("South".into())),
                    ("amount".to_string(), Value::Number(32.0)),
                ]
                .into_iter()
                .collect(),
            ),
        ];

        let job = Job {
            id: "weekly_report".to_string(),
            name: "Weekly Report".to_string(),
            enabled: true,
            schedule: JobSchedule {
                frequency: Frequency::Daily,
                time: "09:00".to_string(),
                day_of_week: 1,
                day_of_month: 1,
            },
            kind: JobKind::Template {
                params: TemplateJobParams {
                    table: "tbl_sales".to_string(),
                    template: template_path,
                    title: None,
                    group_by: None,
                    publish: false,
                    output_local: Some(output_path.clone()),
                    extra_context: None,
                },
            },
        };

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"))
            .with_source(Arc::new(FakeSource { records }));
        let results = runner.run_due(&[job], &store, None).await.unwrap();
        assert_eq!(results[0].status, RunStatus::Success);

        let rendered = std::fs::read_to_string(&output_path).unwrap();
        assert!(rendered.starts_with("# Sales 2026-08-05"));
        assert!(rendered.contains("- North: 10"));
        assert!(rendered.contains("- South: 32"));
        assert!(rendered.contains("Total: 42"));
    }

    #[tokio::test]
    async fn jobs_execute_sequentially_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        let jobs = vec![
            demo_audit_job("first", false),
            demo_audit_job("second", false),
        ];

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"));
        let results = runner.run_due(&jobs, &store, None).await.unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(order, ["first", "second"]);
    }

    #[tokio::test]
    async fn corrupt_state_fails_the_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json at all").unwrap();

        let runner = Runner::new(clock_at("2026-08-05T09:30:00Z"));
        let err = runner
            .run_due(
                &[demo_audit_job("daily_audit", false)],
                &StateStore::new(path),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedError::State(_)));
    }

    #[test]
    fn extract_title_reads_first_heading() {
        assert_eq!(
            extract_title("# Weekly Summary\nbody").as_deref(),
            Some("Weekly Summary")
        );
        assert_eq!(extract_title("no heading here"), None);
    }
}
