//! Render-context builder for template reports.
//!
//! Turns a fetched record set into the `Value` tree templates consume:
//! cleaned rows, field list, optional grouping, and an automatic summary
//! section with per-field aggregates.

use indexmap::IndexMap;

use baseops_core::{Record, Value};

use crate::stats::{aggregate_stats, FieldKind};

/// Build a template context from records.
///
/// Context shape:
/// - `records`: display-coerced rows
/// - `total`: record count
/// - `fields`: union of field names, first-seen order
/// - `groups`: rows bucketed by the `group_by` field (when given); rows
///   without the field land under `"uncategorized"`
/// - `summary`: `total`, plus `<field>_sum`/`_avg`/`_max`/`_min` for
///   numeric fields and `by_<field>` frequency maps for categorical ones
///
/// `extra` entries are merged last and override generated keys.
pub fn build_context(
    records: &[Record],
    group_by: Option<&str>,
    extra: Option<&IndexMap<String, Value>>,
) -> Value {
    let rows: Vec<Value> = records.iter().map(clean_row).collect();

    let summary = aggregate_stats(records);
    let field_names: Vec<Value> = summary
        .fields
        .iter()
        .map(|f| Value::String(f.name.clone()))
        .collect();

    let mut ctx: IndexMap<String, Value> = IndexMap::new();
    ctx.insert("records".to_string(), Value::List(rows.clone()));
    ctx.insert("total".to_string(), Value::Number(records.len() as f64));
    ctx.insert("fields".to_string(), Value::List(field_names));

    if let Some(group_field) = group_by {
        let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
        for row in &rows {
            let key = row
                .get_path(group_field)
                .and_then(Value::as_text)
                .unwrap_or_else(|| "uncategorized".to_string());
            groups.entry(key).or_default().push(row.clone());
        }
        ctx.insert(
            "groups".to_string(),
            Value::Map(
                groups
                    .into_iter()
                    .map(|(k, v)| (k, Value::List(v)))
                    .collect(),
            ),
        );
    }

    let mut summary_map: IndexMap<String, Value> = IndexMap::new();
    summary_map.insert("total".to_string(), Value::Number(records.len() as f64));
    for field in &summary.fields {
        match field.kind {
            FieldKind::Numeric => {
                if let Some(n) = &field.numeric {
                    summary_map.insert(format!("{}_sum", field.name), round2(n.sum).into());
                    summary_map.insert(format!("{}_avg", field.name), round2(n.mean).into());
                    summary_map.insert(format!("{}_max", field.name), Value::Number(n.max));
                    summary_map.insert(format!("{}_min", field.name), Value::Number(n.min));
                }
            }
            FieldKind::Categorical => {
                if let Some(freq) = &field.frequencies {
                    let dist: IndexMap<String, Value> = freq
                        .iter()
                        .map(|(v, c)| (v.clone(), Value::Number(*c as f64)))
                        .collect();
                    summary_map.insert(format!("by_{}", field.name), Value::Map(dist));
                }
            }
            FieldKind::Empty => {}
        }
    }
    ctx.insert("summary".to_string(), Value::Map(summary_map));

    if let Some(extra) = extra {
        for (key, value) in extra {
            ctx.insert(key.clone(), value.clone());
        }
    }

    Value::Map(ctx)
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Flatten platform field values into template-friendly scalars.
///
/// Rich-text fragment lists and person/link maps collapse to their text;
/// plain scalar lists (multi-select) are kept as lists.
fn clean_row(record: &Record) -> Value {
    let row: IndexMap<String, Value> = record
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), clean_value(value)))
        .collect();
    Value::Map(row)
}

fn clean_value(value: &Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        Value::List(items) => {
            let all_scalar = items
                .iter()
                .all(|i| matches!(i, Value::String(_) | Value::Number(_) | Value::Bool(_)));
            if all_scalar {
                value.clone()
            } else {
                match value.as_text() {
                    Some(text) => Value::String(text),
                    None => Value::Null,
                }
            }
        }
        Value::Map(_) => match value.as_text() {
            Some(text) => Value::String(text),
            None => value.clone(),
        },
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, Value)]) -> Record {
        Record::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn fixture() -> Vec<Record> {
        vec![
            record(&[
                ("name", "North".into()),
                ("status", "done".into()),
                ("amount", 10.0.into()),
            ]),
            record(&[
                ("name", "South".into()),
                ("status", "done".into()),
                ("amount", 30.0.into()),
            ]),
            record(&[
                ("name", "West".into()),
                ("status", "active".into()),
                ("amount", 20.0.into()),
            ]),
        ]
    }

    #[test]
    fn totals_and_fields() {
        let ctx = build_context(&fixture(), None, None);
        assert_eq!(ctx.get_path("total"), Some(&Value::Number(3.0)));
        match ctx.get_path("fields") {
            Some(Value::List(names)) => assert_eq!(names.len(), 3),
            other => panic!("expected fields list, got {other:?}"),
        }
    }

    #[test]
    fn numeric_summary_entries() {
        let ctx = build_context(&fixture(), None, None);
        assert_eq!(ctx.get_path("summary.amount_sum"), Some(&Value::Number(60.0)));
        assert_eq!(ctx.get_path("summary.amount_avg"), Some(&Value::Number(20.0)));
        assert_eq!(ctx.get_path("summary.amount_max"), Some(&Value::Number(30.0)));
        assert_eq!(ctx.get_path("summary.amount_min"), Some(&Value::Number(10.0)));
    }

    #[test]
    fn categorical_distribution() {
        let ctx = build_context(&fixture(), None, None);
        assert_eq!(
            ctx.get_path("summary.by_status.done"),
            Some(&Value::Number(2.0))
        );
        assert_eq!(
            ctx.get_path("summary.by_status.active"),
            Some(&Value::Number(1.0))
        );
    }

    #[test]
    fn groups_bucket_rows() {
        let ctx = build_context(&fixture(), Some("status"), None);
        match ctx.get_path("groups.done") {
            Some(Value::List(rows)) => assert_eq!(rows.len(), 2),
            other => panic!("expected done group, got {other:?}"),
        }
    }

    #[test]
    fn rows_missing_group_field_are_uncategorized() {
        let mut records = fixture();
        records.push(record(&[("name", "East".into())]));
        let ctx = build_context(&records, Some("status"), None);
        match ctx.get_path("groups.uncategorized") {
            Some(Value::List(rows)) => assert_eq!(rows.len(), 1),
            other => panic!("expected uncategorized group, got {other:?}"),
        }
    }

    #[test]
    fn extra_overrides_generated_keys() {
        let mut extra = IndexMap::new();
        extra.insert("total".to_string(), Value::String("n/a".into()));
        extra.insert("title".to_string(), Value::String("Weekly".into()));
        let ctx = build_context(&fixture(), None, Some(&extra));
        assert_eq!(ctx.get_path("total"), Some(&Value::String("n/a".into())));
        assert_eq!(ctx.get_path("title"), Some(&Value::String("Weekly".into())));
    }

    #[test]
    fn rich_text_fields_flatten_to_text() {
        let rich = Value::List(vec![Value::Map(
            [("text".to_string(), Value::String("Store One".into()))]
                .into_iter()
                .collect(),
        )]);
        let records = vec![record(&[("store", rich)])];
        let ctx = build_context(&records, None, None);
        assert_eq!(
            ctx.get_path("records").and_then(|r| match r {
                Value::List(rows) => rows[0].get_path("store").cloned(),
                _ => None,
            }),
            Some(Value::String("Store One".into()))
        );
    }
}
