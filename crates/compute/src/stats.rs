//! Per-field aggregation summaries.
//!
//! A field is **numeric** when every non-null value across the records
//! coerces to a number (numeric strings count); a single non-numeric value
//! makes it **categorical**. Numeric fields get count/sum/mean/min/max,
//! categorical fields a top-10 frequency table.

use indexmap::IndexMap;
use serde::Serialize;

use baseops_core::{Record, Value};

/// How many frequency entries a categorical summary keeps.
const TOP_N: usize = 10;

/// Summary for one table.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub total_records: usize,
    pub fields: Vec<FieldSummary>,
}

/// Classification of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Categorical,
    /// No non-null values observed.
    Empty,
}

/// Summary for one field across all records.
#[derive(Debug, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: FieldKind,
    /// Records carrying a non-null value for this field.
    pub filled: usize,
    /// Distinct values (by display text).
    pub distinct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    /// Top-N value frequencies, count-descending then value-ascending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<Vec<(String, usize)>>,
}

#[derive(Debug, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute per-field summaries over a set of records.
///
/// Fields are reported in first-seen order across the records, so output
/// is deterministic for a given input ordering.
pub fn aggregate_stats(records: &[Record]) -> TableSummary {
    // Union of field names, first-seen order.
    let mut field_names: Vec<String> = Vec::new();
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for record in records {
        for name in record.fields.keys() {
            if seen.insert(name.as_str(), ()).is_none() {
                field_names.push(name.clone());
            }
        }
    }

    let fields = field_names
        .into_iter()
        .map(|name| summarize_field(&name, records))
        .collect();

    TableSummary {
        total_records: records.len(),
        fields,
    }
}

fn summarize_field(name: &str, records: &[Record]) -> FieldSummary {
    let values: Vec<&Value> = records
        .iter()
        .filter_map(|r| r.fields.get(name))
        .filter(|v| !v.is_empty_content())
        .collect();

    if values.is_empty() {
        return FieldSummary {
            name: name.to_string(),
            kind: FieldKind::Empty,
            filled: 0,
            distinct: 0,
            numeric: None,
            frequencies: None,
        };
    }

    let mut distinct: IndexMap<String, usize> = IndexMap::new();
    for value in &values {
        *distinct.entry(value.display()).or_insert(0) += 1;
    }

    let numbers: Vec<f64> = values.iter().filter_map(|v| v.coerce_number()).collect();
    if numbers.len() == values.len() {
        let sum: f64 = numbers.iter().sum();
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FieldSummary {
            name: name.to_string(),
            kind: FieldKind::Numeric,
            filled: values.len(),
            distinct: distinct.len(),
            numeric: Some(NumericSummary {
                count: numbers.len(),
                sum,
                mean: sum / numbers.len() as f64,
                min,
                max,
            }),
            frequencies: None,
        }
    } else {
        FieldSummary {
            name: name.to_string(),
            kind: FieldKind::Categorical,
            filled: values.len(),
            distinct: distinct.len(),
            numeric: None,
            frequencies: Some(top_frequencies(&values)),
        }
    }
}

/// Count value occurrences; list values (multi-select) count per element.
fn top_frequencies(values: &[&Value]) -> Vec<(String, usize)> {
    let mut counter: IndexMap<String, usize> = IndexMap::new();
    for value in values {
        match value {
            Value::List(items) => {
                for item in items {
                    *counter.entry(item.display()).or_insert(0) += 1;
                }
            }
            other => {
                *counter.entry(other.display()).or_insert(0) += 1;
            }
        }
    }
    let mut entries: Vec<(String, usize)> = counter.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_N);
    entries
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

    #[test]
    fn all_numeric_values_classify_numeric() {
        let records = vec![
            record(&[("price", 10.0.into())]),
            record(&[("price", 20.0.into())]),
            record(&[("price", 30.0.into())]),
        ];
        let summary = aggregate_stats(&records);
        let price = &summary.fields[0];

        assert_eq!(price.kind, FieldKind::Numeric);
        let n = price.numeric.as_ref().unwrap();
        assert_eq!(n.count, 3);
        assert_eq!(n.sum, 60.0);
        assert_eq!(n.mean, 20.0);
        assert_eq!(n.min, 10.0);
        assert_eq!(n.max, 30.0);
    }

    #[test]
    fn numeric_strings_classify_numeric() {
        let records = vec![
            record(&[("qty", "5".into())]),
            record(&[("qty", "7.5".into())]),
        ];
        let summary = aggregate_stats(&records);
        assert_eq!(summary.fields[0].kind, FieldKind::Numeric);
        assert_eq!(summary.fields[0].numeric.as_ref().unwrap().sum, 12.5);
    }

    #[test]
    fn one_non_numeric_value_makes_field_categorical() {
        let records = vec![
            record(&[("qty", 5.0.into())]),
            record(&[("qty", "n/a".into())]),
        ];
        let summary = aggregate_stats(&records);
        assert_eq!(summary.fields[0].kind, FieldKind::Categorical);
        assert!(summary.fields[0].numeric.is_none());
    }

    #[test]
    fn nulls_do_not_affect_classification() {
        let records = vec![
            record(&[("qty", 5.0.into())]),
            record(&[("qty", Value::Null)]),
        ];
        let summary = aggregate_stats(&records);
        assert_eq!(summary.fields[0].kind, FieldKind::Numeric);
        assert_eq!(summary.fields[0].filled, 1);
    }

    #[test]
    fn categorical_frequency_ordering() {
        let records = vec![
            record(&[("status", "open".into())]),
            record(&[("status", "open".into())]),
            record(&[("status", "closed".into())]),
            record(&[("status", "archived".into())]),
        ];
        let summary = aggregate_stats(&records);
        let freq = summary.fields[0].frequencies.as_ref().unwrap();

        // Count-descending, then value-ascending for ties.
        assert_eq!(freq[0], ("open".to_string(), 2));
        assert_eq!(freq[1], ("archived".to_string(), 1));
        assert_eq!(freq[2], ("closed".to_string(), 1));
    }

    #[test]
    fn multi_select_lists_count_per_element() {
        let records = vec![
            record(&[("tags", Value::List(vec!["a".into(), "b".into()]))]),
            record(&[("tags", Value::List(vec!["a".into()]))]),
        ];
        let summary = aggregate_stats(&records);
        let freq = summary.fields[0].frequencies.as_ref().unwrap();
        assert_eq!(freq[0], ("a".to_string(), 2));
        assert_eq!(freq[1], ("b".to_string(), 1));
    }

    #[test]
    fn differing_field_sets_union_in_first_seen_order() {
        let records = vec![
            record(&[("a", 1.0.into())]),
            record(&[("b", "x".into()), ("a", 2.0.into())]),
        ];
        let summary = aggregate_stats(&records);
        let names: Vec<&str> = summary.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn absent_field_reports_empty_kind() {
        let records = vec![
            record(&[("a", Value::Null)]),
            record(&[("a", "".into())]),
        ];
        let summary = aggregate_stats(&records);
        assert_eq!(summary.fields[0].kind, FieldKind::Empty);
        assert_eq!(summary.fields[0].distinct, 0);
    }
}
