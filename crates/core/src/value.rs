//! Schema-less value tree and record types.
//!
//! Tables on the remote platform have no fixed schema: two records in the
//! same table may carry different field sets, and field values range from
//! plain scalars to rich-text fragment lists. Everything downstream (join,
//! stats, templates, audit rules) works on this one [`Value`] tree; field
//! access is a lookup returning `Option`, never a panic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field map of a single record. Insertion-ordered so output is stable.
pub type Fields = IndexMap<String, Value>;

/// One row-equivalent unit of data from a table.
///
/// `record_id` is the platform-assigned opaque identifier; records built
/// locally (file imports, demo data) have none until created remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

impl Record {
    /// Record with fields only (no remote identity yet).
    pub fn new(fields: Fields) -> Self {
        Self {
            record_id: None,
            fields,
        }
    }
}

/// A dynamically typed field value.
///
/// Untagged so it deserializes transparently from both JSON and YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Resolve a dotted path (`summary.total`) against this value.
    ///
    /// Any segment that is not a map key returns `None`; callers decide
    /// whether a miss is an error or renders as empty.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for part in path.split('.') {
            match current {
                Value::Map(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Coerce to a number: numbers pass through, numeric strings parse.
    ///
    /// Booleans, lists, and maps never coerce. This is the classification
    /// primitive for numeric-vs-categorical field summaries.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness for `{{#if}}` blocks: null, false, zero, and empty
    /// strings/lists/maps are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Whether the value carries no usable content (null, empty string,
    /// empty list). Used to skip all-empty rows in each-blocks.
    pub fn is_empty_content(&self) -> bool {
        matches!(self, Value::Null)
            || matches!(self, Value::String(s) if s.is_empty())
            || matches!(self, Value::List(items) if items.is_empty())
    }

    /// Human-readable rendering for template output.
    ///
    /// Integral floats drop the decimal point, fractional floats keep two
    /// decimals, lists are comma-joined, maps fall back to compact JSON.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Extract join-key text from a platform field value.
    ///
    /// Rich-text fields arrive as lists of `{text: ...}` fragments; person
    /// and link fields as maps with a `text`/`value` entry. Returns `None`
    /// when no text can be extracted (the record then never matches).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(s.clone()),
            Value::List(items) => {
                let mut text = String::new();
                for item in items {
                    match item {
                        Value::Map(map) => {
                            if let Some(Value::String(t)) = map.get("text") {
                                text.push_str(t);
                            }
                        }
                        Value::String(s) => text.push_str(s),
                        other => {
                            if let Some(t) = other.as_text() {
                                text.push_str(&t);
                            }
                        }
                    }
                }
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Value::Map(map) => match map.get("text").or_else(|| map.get("value")) {
                Some(inner) => inner.as_text(),
                None => None,
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn get_path_nested() {
        let v = map(&[("summary", map(&[("total", Value::Number(42.0))]))]);
        assert_eq!(v.get_path("summary.total"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn get_path_missing_segment() {
        let v = map(&[("a", Value::Number(1.0))]);
        assert_eq!(v.get_path("a.b"), None);
        assert_eq!(v.get_path("nope"), None);
    }

    #[test]
    fn coerce_number_from_string() {
        assert_eq!(Value::String("3.14".into()).coerce_number(), Some(3.14));
        assert_eq!(Value::String(" 7 ".into()).coerce_number(), Some(7.0));
        assert_eq!(Value::String("seven".into()).coerce_number(), None);
        assert_eq!(Value::Bool(true).coerce_number(), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Number(0.5).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
    }

    #[test]
    fn display_numbers() {
        assert_eq!(Value::Number(3.0).display(), "3");
        assert_eq!(Value::Number(3.14159).display(), "3.14");
        assert_eq!(Value::Null.display(), "");
    }

    #[test]
    fn display_list_joins() {
        let v = Value::List(vec!["a".into(), "b".into()]);
        assert_eq!(v.display(), "a, b");
    }

    #[test]
    fn as_text_rich_fragments() {
        let v = Value::List(vec![
            map(&[("text", "Store ".into())]),
            map(&[("text", "One".into())]),
        ]);
        assert_eq!(v.as_text().as_deref(), Some("Store One"));
    }

    #[test]
    fn as_text_map_unwraps() {
        let v = map(&[("text", "hello".into())]);
        assert_eq!(v.as_text().as_deref(), Some("hello"));
        assert_eq!(Value::Null.as_text(), None);
    }

    #[test]
    fn untagged_json_round_trip() {
        let json = r#"{"name":"A","count":2,"tags":["x","y"],"open":true,"gone":null}"#;
        let v: Value = serde_json::from_str(json).unwrap();
        assert_eq!(v.get_path("name"), Some(&Value::String("A".into())));
        assert_eq!(v.get_path("count"), Some(&Value::Number(2.0)));
        assert!(matches!(v.get_path("gone"), Some(Value::Null)));
    }
}
