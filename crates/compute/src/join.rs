//! Left-outer natural-key join across two tables.
//!
//! The right table is indexed by the join field's text value; each left
//! record is merged with every matching right record (fan-out on duplicate
//! keys). Left records with no match still appear, with right-side fields
//! absent. Collision policy: the right-hand value overwrites the left.

use indexmap::IndexMap;

use baseops_core::{Fields, Record, Value};

/// Join `left` and `right` on the named field.
///
/// - Every unmatched left record appears exactly once, untouched.
/// - A left record whose key matches N right records produces N merged
///   records (natural keys are not assumed unique).
/// - Right records whose join field is absent or text-empty never match.
pub fn join(left: &[Record], right: &[Record], on: &str) -> Vec<Fields> {
    // Index the right side by join-key text.
    let mut right_index: IndexMap<String, Vec<&Fields>> = IndexMap::new();
    for record in right {
        if let Some(key) = record.fields.get(on).and_then(Value::as_text) {
            right_index.entry(key).or_default().push(&record.fields);
        }
    }

    let mut results = Vec::with_capacity(left.len());
    for record in left {
        let key = record.fields.get(on).and_then(Value::as_text);
        let matches = key.as_deref().and_then(|k| right_index.get(k));
        match matches {
            Some(rights) => {
                for right_fields in rights {
                    let mut merged = record.fields.clone();
                    for (name, value) in right_fields.iter() {
                        // Right overwrites left on field-name collision.
                        merged.insert(name.clone(), value.clone());
                    }
                    results.push(merged);
                }
            }
            None => results.push(record.fields.clone()),
        }
    }
    results
}

/// Restrict merged rows to the selected field names (order preserved).
pub fn project(rows: Vec<Fields>, select: &[String]) -> Vec<Fields> {
    rows.into_iter()
        .map(|row| {
            select
                .iter()
                .filter_map(|name| row.get(name).map(|v| (name.clone(), v.clone())))
                .collect()
        })
        .collect()
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

    fn left_fixture() -> Vec<Record> {
        vec![
            record(&[("store", "A".into()), ("sales", 100.0.into())]),
            record(&[("store", "B".into()), ("sales", 200.0.into())]),
            record(&[("store", "C".into()), ("sales", 300.0.into())]),
        ]
    }

    #[test]
    fn matching_pairs_merge_once() {
        let right = vec![record(&[("store", "A".into()), ("target", 120.0.into())])];
        let rows = join(&left_fixture(), &right, "store");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("target"), Some(&Value::Number(120.0)));
    }

    #[test]
    fn unmatched_left_appears_once_without_right_fields() {
        let right = vec![record(&[("store", "A".into()), ("target", 120.0.into())])];
        let rows = join(&left_fixture(), &right, "store");

        let b = &rows[1];
        assert_eq!(b.get("store"), Some(&Value::String("B".into())));
        assert!(!b.contains_key("target"), "no null-padding for misses");
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let right = vec![
            record(&[("store", "A".into()), ("quarter", "Q1".into())]),
            record(&[("store", "A".into()), ("quarter", "Q2".into())]),
        ];
        let rows = join(&left_fixture(), &right, "store");

        // A fans out into two rows; B and C appear once each.
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].get("quarter"), Some(&Value::String("Q1".into())));
        assert_eq!(rows[1].get("quarter"), Some(&Value::String("Q2".into())));
    }

    #[test]
    fn right_overwrites_left_on_collision() {
        let left = vec![record(&[("store", "A".into()), ("rank", 1.0.into())])];
        let right = vec![record(&[("store", "A".into()), ("rank", 9.0.into())])];
        let rows = join(&left, &right, "store");

        assert_eq!(rows[0].get("rank"), Some(&Value::Number(9.0)));
    }

    #[test]
    fn left_without_join_field_is_kept_unmatched() {
        let left = vec![record(&[("name", "orphan".into())])];
        let right = vec![record(&[("store", "A".into()), ("target", 1.0.into())])];
        let rows = join(&left, &right, "store");

        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("target"));
    }

    #[test]
    fn rich_text_keys_match_plain_strings() {
        // Platform rich-text field: list of {text} fragments.
        let rich = Value::List(vec![Value::Map(
            [("text".to_string(), Value::String("A".into()))]
                .into_iter()
                .collect(),
        )]);
        let left = vec![record(&[("store", rich), ("sales", 5.0.into())])];
        let right = vec![record(&[("store", "A".into()), ("target", 6.0.into())])];
        let rows = join(&left, &right, "store");

        assert_eq!(rows[0].get("target"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn numeric_keys_join_by_text_value() {
        let left = vec![record(&[("sku", 42.0.into())])];
        let right = vec![record(&[("sku", "42".into()), ("name", "Widget".into())])];
        let rows = join(&left, &right, "sku");

        assert_eq!(rows[0].get("name"), Some(&Value::String("Widget".into())));
    }

    #[test]
    fn project_keeps_selected_in_order() {
        let right = vec![record(&[("store", "A".into()), ("target", 120.0.into())])];
        let rows = project(
            join(&left_fixture(), &right, "store"),
            &["target".to_string(), "store".to_string()],
        );

        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["target", "store"]);
        // Unmatched rows simply lack the projected right-side field.
        assert_eq!(rows[1].keys().collect::<Vec<_>>(), ["store"]);
    }
}
