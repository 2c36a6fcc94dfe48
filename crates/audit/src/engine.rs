//! Audit evaluation engine.
//!
//! Runs every enabled rule against every store, producing findings and a
//! per-store health score. Rules are independent; evaluation order does
//! not matter, but findings are sorted severity-descending then
//! rule-id-ascending so reports are reproducible.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use baseops_core::Fields;

use crate::checkers::checker;
use crate::schema::{AuditConfig, Severity};

/// Table-level context shared by all stores in one audit run.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    /// Fleet-average daily units sold, used to project sell-out days when
    /// a store has no explicit days-remaining column.
    pub daily_avg_sold: Option<f64>,
}

/// One diagnostic result from evaluating a single rule against one store.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    /// Subject entity (store) identifier.
    pub store: String,
    /// Rule display name.
    pub name: String,
    pub metric: String,
    pub detail: String,
    pub suggestion: String,
    /// The numeric values that tripped the rule.
    pub values: Vec<(String, f64)>,
}

/// Severity tallies plus the count of stores without any finding.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub healthy: usize,
}

/// Health score entry for one store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreScore {
    pub store: String,
    /// 0..=100, severity-weighted deductions from 100.
    pub score: f64,
    pub findings: usize,
}

/// Result of one audit run.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub audit_time: DateTime<Utc>,
    pub industry: String,
    pub total_stores: usize,
    pub summary: SeveritySummary,
    pub findings: Vec<Finding>,
    /// Score-ascending ranking (worst store first).
    pub store_scores: Vec<StoreScore>,
}

/// Evaluate all enabled rules against a single store.
///
/// Disabled rules are never evaluated; rules whose checker cannot read a
/// required field are skipped for this store. The returned findings are
/// sorted severity-descending, then rule-id-ascending.
pub fn evaluate_store(
    store: &Fields,
    ctx: &AuditContext,
    cfg: &AuditConfig,
) -> Vec<Finding> {
    let store_name = cfg
        .text_field(store, "store_name")
        .unwrap_or_else(|| "unknown".to_string());

    let mut findings = Vec::new();
    for (rule_id, rule) in &cfg.rules {
        if !rule.enabled {
            continue;
        }
        let Some(check) = checker(rule_id) else {
            warn!(rule_id = %rule_id, "no checker registered for rule, skipping");
            continue;
        };
        if let Some(trigger) = check(store, ctx, rule, cfg) {
            debug!(rule_id = %rule_id, store = %store_name, "rule fired");
            findings.push(Finding {
                rule_id: rule_id.clone(),
                severity: rule.level,
                store: store_name.clone(),
                name: rule.name.clone(),
                metric: trigger.metric,
                detail: trigger.detail,
                suggestion: trigger.suggestion,
                values: trigger.values,
            });
        }
    }

    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    findings
}

/// Run the audit over a whole store list.
///
/// `audit_time` is injected by the caller (from a clock) so the report is
/// reproducible.
pub fn run_audit(
    stores: &[Fields],
    ctx: &AuditContext,
    cfg: &AuditConfig,
    audit_time: DateTime<Utc>,
) -> AuditReport {
    let mut summary = SeveritySummary::default();
    let mut all_findings = Vec::new();
    let mut store_scores = Vec::with_capacity(stores.len());

    for store in stores {
        let findings = evaluate_store(store, ctx, cfg);
        let store_name = cfg
            .text_field(store, "store_name")
            .unwrap_or_else(|| "unknown".to_string());

        for finding in &findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        if findings.is_empty() {
            summary.healthy += 1;
        }

        let mut score = 100.0;
        for finding in &findings {
            score -= cfg.scoring.penalty(finding.severity);
        }
        store_scores.push(StoreScore {
            store: store_name,
            score: score.clamp(0.0, 100.0),
            findings: findings.len(),
        });

        all_findings.extend(findings);
    }

    // Worst health first; ties broken by store name for stable output.
    store_scores.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.store.cmp(&b.store))
    });

    AuditReport {
        audit_time,
        industry: cfg.industry.clone(),
        total_stores: stores.len(),
        summary,
        findings: all_findings,
        store_scores,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use baseops_core::Value;
    use chrono::TimeZone;

    fn cfg() -> AuditConfig {
        AuditConfig::default_config()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap()
    }

    fn store(entries: &[(&str, Value)]) -> Fields {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Store that trips both sell_through_high (critical) and
    /// low_sell_rate (warning).
    fn troubled_store() -> Fields {
        store(&[
            ("Store Name", Value::String("Troubled".into())),
            ("Initial Stock", Value::Number(100.0)),
            ("Sold Quantity", Value::Number(90.0)),
            ("Current Stock", Value::Number(10.0)),
            ("Days Remaining", Value::Number(2.0)),
            ("Total SKUs", Value::Number(100.0)),
            ("Active SKUs", Value::Number(30.0)),
        ])
    }

    #[test]
    fn spec_example_yields_one_critical_finding() {
        let s = store(&[
            ("Store Name", Value::String("S1".into())),
            ("Initial Stock", Value::Number(100.0)),
            ("Sold Quantity", Value::Number(90.0)),
            ("Days Remaining", Value::Number(2.0)),
        ]);
        let findings = evaluate_store(&s, &AuditContext::default(), &cfg());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "sell_through_high");
        assert_eq!(findings[0].severity, Severity::Critical);

        // Relaxing days-remaining silences the rule.
        let mut relaxed = s;
        relaxed.insert("Days Remaining".to_string(), Value::Number(10.0));
        assert!(evaluate_store(&relaxed, &AuditContext::default(), &cfg()).is_empty());
    }

    #[test]
    fn findings_sorted_severity_then_rule_id() {
        let findings = evaluate_store(&troubled_store(), &AuditContext::default(), &cfg());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::Warning);
    }

    #[test]
    fn disabled_rule_never_fires() {
        let mut config = cfg();
        config.rules.get_mut("sell_through_high").unwrap().enabled = false;
        config.rules.get_mut("low_sell_rate").unwrap().enabled = false;
        let findings = evaluate_store(&troubled_store(), &AuditContext::default(), &config);
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_fields_skip_rules_not_audit() {
        // Only target fields present: every stock rule skips, target fires.
        let s = store(&[
            ("Store Name", Value::String("Sparse".into())),
            ("Actual Sales", Value::Number(100.0)),
            ("Target Sales", Value::Number(1000.0)),
        ]);
        let findings = evaluate_store(&s, &AuditContext::default(), &cfg());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "target_achievement_low");
    }

    #[test]
    fn run_audit_totals_and_healthy_count() {
        let healthy = store(&[
            ("Store Name", Value::String("Healthy".into())),
            ("Initial Stock", Value::Number(100.0)),
            ("Sold Quantity", Value::Number(50.0)),
            ("Current Stock", Value::Number(50.0)),
        ]);
        let report = run_audit(
            &[troubled_store(), healthy],
            &AuditContext::default(),
            &cfg(),
            now(),
        );
        assert_eq!(report.total_stores, 2);
        assert_eq!(report.summary.critical, 1);
        assert_eq!(report.summary.warning, 1);
        assert_eq!(report.summary.healthy, 1);
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn health_score_deducts_per_finding_and_ranks_worst_first() {
        let healthy = store(&[
            ("Store Name", Value::String("Healthy".into())),
            ("Initial Stock", Value::Number(100.0)),
            ("Sold Quantity", Value::Number(50.0)),
            ("Current Stock", Value::Number(50.0)),
        ]);
        let report = run_audit(
            &[healthy, troubled_store()],
            &AuditContext::default(),
            &cfg(),
            now(),
        );
        // Troubled: 100 - 25 (critical) - 10 (warning) = 65, ranked first.
        assert_eq!(report.store_scores[0].store, "Troubled");
        assert_eq!(report.store_scores[0].score, 65.0);
        assert_eq!(report.store_scores[1].score, 100.0);
    }

    #[test]
    fn health_score_floors_at_zero() {
        let mut config = cfg();
        config.scoring.critical_penalty = 80.0;
        config.scoring.warning_penalty = 80.0;
        let report = run_audit(
            &[troubled_store()],
            &AuditContext::default(),
            &config,
            now(),
        );
        assert_eq!(report.store_scores[0].score, 0.0);
    }

    #[test]
    fn unknown_rule_in_config_is_skipped() {
        let mut config = cfg();
        config.rules.insert(
            "made_up_rule".to_string(),
            config.rules["zero_sales"].clone(),
        );
        // Must not panic; the unknown id simply produces nothing.
        let findings = evaluate_store(&troubled_store(), &AuditContext::default(), &config);
        assert!(findings.iter().all(|f| f.rule_id != "made_up_rule"));
    }
}
