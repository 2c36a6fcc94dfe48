//! `table` subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::Utc;
use serde_json::json;

use baseops_compute::{aggregate_stats, join, project};
use baseops_core::Fields;

use crate::import;
use crate::remote;

pub async fn batch_create(
    app: Option<&str>,
    table: &str,
    data: &Path,
    dry_run: bool,
) -> Result<()> {
    let records = import::load_records(data)?;
    if records.is_empty() {
        println!("{}", json!({ "created": 0, "message": "no records to create" }));
        return Ok(());
    }
    if dry_run {
        let sample: Vec<&Fields> = records.iter().take(3).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "would_create": records.len(),
                "sample": sample,
            }))?
        );
        return Ok(());
    }

    let bitable = remote::bitable(app)?;
    let report = bitable.batch_create(table, &records).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_complete() {
        bail!(
            "{} of {} records failed to create",
            report.total - report.done,
            report.total
        );
    }
    Ok(())
}

pub async fn batch_update(
    app: Option<&str>,
    table: &str,
    data: &Path,
    dry_run: bool,
) -> Result<()> {
    let updates = import::load_updates(data)?;
    if updates.is_empty() {
        println!("{}", json!({ "updated": 0, "message": "no records to update" }));
        return Ok(());
    }
    if dry_run {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "would_update": updates.len() }))?
        );
        return Ok(());
    }

    let bitable = remote::bitable(app)?;
    let report = bitable.batch_update(table, &updates).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_complete() {
        bail!(
            "{} of {} records failed to update",
            report.total - report.done,
            report.total
        );
    }
    Ok(())
}

pub async fn join_tables(
    app: Option<&str>,
    left: &str,
    right: &str,
    on: &str,
    select: Option<&str>,
) -> Result<()> {
    let bitable = remote::bitable(app)?;
    let left_records = bitable.list_all_records(left).await?;
    let right_records = bitable.list_all_records(right).await?;

    let mut rows = join(&left_records, &right_records, on);
    if let Some(select) = select {
        let fields: Vec<String> = select
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        rows = project(rows, &fields);
    }
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

pub async fn stats(app: Option<&str>, table: &str) -> Result<()> {
    let bitable = remote::bitable(app)?;
    let records = bitable.list_all_records(table).await?;
    let summary = aggregate_stats(&records);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub async fn snapshot(app: Option<&str>, table: &str, output_dir: &Path) -> Result<()> {
    let bitable = remote::bitable(app)?;
    let fields = bitable.list_fields(table).await?;
    let records = bitable.list_all_records(table).await?;

    std::fs::create_dir_all(output_dir)?;
    let now = Utc::now();
    let path: PathBuf =
        output_dir.join(format!("{table}_{}.json", now.format("%Y%m%d_%H%M%S")));

    let snapshot = json!({
        "table_id": table,
        "snapshot_time": now.to_rfc3339(),
        "field_count": fields.len(),
        "record_count": records.len(),
        "fields": fields
            .iter()
            .map(|f| json!({ "name": f.field_name, "type": f.field_type }))
            .collect::<Vec<_>>(),
        "records": records,
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
    println!("snapshot saved: {}", path.display());
    Ok(())
}

pub async fn import_file(
    app: Option<&str>,
    data: &Path,
    table: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    match table {
        Some(table) => batch_create(app, table, data, dry_run).await,
        None => {
            // Preview only: show what the loader parsed.
            let records = import::load_records(data)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "records": records.len(),
                    "sample": records.iter().take(5).collect::<Vec<_>>(),
                }))?
            );
            Ok(())
        }
    }
}
