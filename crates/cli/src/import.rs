//! Record loading from local JSON and CSV files.
//!
//! JSON accepts either an array of field maps or an object with a
//! `records` key. CSV values that parse as numbers are coerced so stats
//! and audit thresholds see them numerically. Quoted CSV fields may
//! contain commas and doubled-quote escapes; embedded newlines are not
//! supported.

use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use baseops_core::{Fields, Value};

/// Load records (field maps) from a `.json` or `.csv` file.
pub fn load_records(path: &Path) -> Result<Vec<Fields>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    match ext.as_str() {
        "json" => load_json(&text),
        "csv" => load_csv(&text),
        other => bail!("unsupported data file extension '.{other}' (use .json or .csv)"),
    }
}

/// Load batch-update entries: a JSON array of `{record_id, fields}`.
pub fn load_updates(path: &Path) -> Result<IndexMap<String, Fields>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    #[derive(serde::Deserialize)]
    struct Entry {
        record_id: String,
        fields: Fields,
    }

    let entries: Vec<Entry> =
        serde_json::from_str(&text).context("update file must be [{record_id, fields}, ...]")?;
    Ok(entries
        .into_iter()
        .map(|e| (e.record_id, e.fields))
        .collect())
}

fn load_json(text: &str) -> Result<Vec<Fields>> {
    let value: Value = serde_json::from_str(text).context("invalid JSON")?;
    let items = match &value {
        Value::List(items) => items.clone(),
        Value::Map(map) => match map.get("records") {
            Some(Value::List(items)) => items.clone(),
            _ => bail!("JSON must be an array or an object with a 'records' array"),
        },
        _ => bail!("JSON must be an array or an object with a 'records' array"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Map(fields) => Ok(fields),
            other => bail!("record {i} is not an object: {other:?}"),
        })
        .collect()
}

fn load_csv(text: &str) -> Result<Vec<Fields>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };
    let header = split_csv_line(header_line)?;

    let mut records = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let cells = split_csv_line(line)
            .with_context(|| format!("CSV line {}", line_no + 2))?;
        let mut fields = Fields::new();
        for (name, cell) in header.iter().zip(cells.iter()) {
            fields.insert(name.clone(), coerce_cell(cell));
        }
        records.push(fields);
    }
    Ok(records)
}

/// Split one CSV line, honoring double-quoted fields with `""` escapes.
fn split_csv_line(line: &str) -> Result<Vec<String>> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if cell.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            other => cell.push(other),
        }
    }
    if in_quotes {
        bail!("unterminated quote in CSV line");
    }
    cells.push(cell);
    Ok(cells)
}

/// Numeric-looking cells become numbers; everything else stays text.
fn coerce_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::String(cell.to_string()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
