//! Markdown rendering of audit reports.
//!
//! Flat text/markdown only; the publish collaborator decides how the
//! destination formats it.

use crate::engine::AuditReport;
use crate::schema::Severity;

/// Render an audit report as markdown.
pub fn render_markdown(report: &AuditReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    let date = report.audit_time.format("%Y-%m-%d");

    lines.push(format!("# Store Operations Audit {date}"));
    if !report.industry.is_empty() {
        lines.push(format!("> Industry profile: {}", report.industry));
    }
    lines.push(String::new());

    // Overview
    lines.push("## Overview".to_string());
    lines.push(String::new());
    let total = report.total_stores;
    lines.push(format!("- Stores audited: {total}"));
    let healthy_pct = if total > 0 {
        format!(
            " ({:.0}%)",
            report.summary.healthy as f64 / total as f64 * 100.0
        )
    } else {
        String::new()
    };
    lines.push(format!(
        "- Healthy stores: {}{}",
        report.summary.healthy, healthy_pct
    ));
    lines.push(format!("- Critical findings: {}", report.summary.critical));
    lines.push(format!("- Warnings: {}", report.summary.warning));
    lines.push(String::new());

    push_severity_section(
        &mut lines,
        report,
        Severity::Critical,
        "## Critical findings (immediate action)",
    );
    push_severity_section(&mut lines, report, Severity::Warning, "## Warnings");

    // Health ranking
    lines.push("## Store health ranking".to_string());
    lines.push(String::new());
    lines.push("| Rank | Store | Score | Findings |".to_string());
    lines.push("|------|-------|-------|----------|".to_string());
    for (rank, entry) in report.store_scores.iter().enumerate() {
        lines.push(format!(
            "| {} | {} | {:.0} | {} |",
            rank + 1,
            entry.store,
            entry.score,
            entry.findings
        ));
    }
    lines.push(String::new());

    lines.join("\n")
}

fn push_severity_section(
    lines: &mut Vec<String>,
    report: &AuditReport,
    severity: Severity,
    heading: &str,
) {
    let matching: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.severity == severity)
        .collect();
    if matching.is_empty() {
        return;
    }

    lines.push(heading.to_string());
    lines.push(String::new());
    for finding in matching {
        lines.push(format!("### {} — {}", finding.store, finding.name));
        lines.push(format!("- **Metric**: {}", finding.metric));
        lines.push(format!("- **Detail**: {}", finding.detail));
        lines.push(format!("- **Suggestion**: {}", finding.suggestion));
        lines.push(String::new());
    }
}

// ── Tests ───────────────────────────────────────────────────────────
