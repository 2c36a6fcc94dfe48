//! `audit` subcommand handlers.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use baseops_audit::engine::AuditContext;
use baseops_audit::{demo_stores, render_markdown, run_audit, AuditConfig};
use baseops_compute::join;
use baseops_core::{DocumentPublisher, Fields};

use crate::remote;

fn load_config(path: Option<&Path>) -> Result<AuditConfig> {
    match path {
        Some(path) => AuditConfig::load(path)
            .with_context(|| format!("cannot load audit config {}", path.display())),
        None => Ok(AuditConfig::default_config()),
    }
}

async fn audit_and_deliver(
    stores: Vec<Fields>,
    config: &AuditConfig,
    publish: bool,
    folder: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let report = run_audit(&stores, &AuditContext::default(), config, Utc::now());
    eprintln!(
        "audit complete: {} critical, {} warnings, {} healthy of {} stores",
        report.summary.critical,
        report.summary.warning,
        report.summary.healthy,
        report.total_stores
    );

    let markdown = render_markdown(&report);

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &markdown)?;
        eprintln!("report saved: {}", path.display());
    }

    if publish {
        let docs = remote::docs(folder)?;
        let title = format!(
            "Store Operations Audit {}",
            report.audit_time.format("%Y-%m-%d")
        );
        let doc = docs.publish_document(&title, &markdown).await?;
        println!("document published: {}", doc.url);
    } else if output.is_none() {
        println!("{markdown}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    app: Option<&str>,
    table: &str,
    target_table: Option<&str>,
    config: Option<&Path>,
    publish: bool,
    folder: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let bitable = remote::bitable(app)?;

    let sales = bitable.list_all_records(table).await?;
    let stores: Vec<Fields> = match target_table {
        Some(target) => {
            // Correlate sales with targets on the mapped store-name column.
            let targets = bitable.list_all_records(target).await?;
            let joined = join(&sales, &targets, config.field_label("store_name"));
            if joined.is_empty() {
                sales.into_iter().map(|r| r.fields).collect()
            } else {
                joined
            }
        }
        None => sales.into_iter().map(|r| r.fields).collect(),
    };
    eprintln!("fetched {} store records", stores.len());

    audit_and_deliver(stores, &config, publish, folder, output).await
}

pub async fn demo(
    config: Option<&Path>,
    count: usize,
    publish: bool,
    folder: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    eprintln!(
        "industry profile: {} ({} rules enabled)",
        config.industry,
        config.enabled_rules()
    );
    let stores = demo_stores(count);
    audit_and_deliver(stores, &config, publish, folder, output).await
}

pub fn list_configs(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("config directory not found: {}", dir.display());
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    entries.sort();

    if entries.is_empty() {
        println!("no config files in {}", dir.display());
        return Ok(());
    }

    println!("available audit configs:");
    for path in entries {
        match AuditConfig::load(&path) {
            Ok(cfg) => println!(
                "  {} — {} ({} rules enabled)",
                path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                cfg.industry,
                cfg.enabled_rules()
            ),
            Err(e) => println!(
                "  {} — unreadable: {e}",
                path.file_name().and_then(|n| n.to_str()).unwrap_or("?")
            ),
        }
    }
    Ok(())
}
