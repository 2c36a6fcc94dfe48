//! Audit rule configuration schema.
//!
//! Rule sets are plain YAML: an ordered map of rule id to enabled flag,
//! severity level, and named numeric thresholds, plus a field mapping that
//! translates the logical keys the checkers use into the actual column
//! labels of the audited table.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use baseops_core::{Fields, Value};

use crate::AuditError;

/// Severity of a finding. Ordering is ascending (`Info < Warning <
/// Critical`) so findings can be sorted severity-descending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Configuration of a single audit rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub level: Severity,
    /// Human-readable rule name used in reports.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Named numeric thresholds consumed by the rule's checker.
    #[serde(default)]
    pub thresholds: IndexMap<String, f64>,
}

fn default_true() -> bool {
    true
}

/// Per-severity health score deductions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    #[serde(default = "default_critical_penalty")]
    pub critical_penalty: f64,
    #[serde(default = "default_warning_penalty")]
    pub warning_penalty: f64,
    #[serde(default = "default_info_penalty")]
    pub info_penalty: f64,
}

fn default_critical_penalty() -> f64 {
    25.0
}

fn default_warning_penalty() -> f64 {
    10.0
}

fn default_info_penalty() -> f64 {
    3.0
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            critical_penalty: default_critical_penalty(),
            warning_penalty: default_warning_penalty(),
            info_penalty: default_info_penalty(),
        }
    }
}

impl Scoring {
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical_penalty,
            Severity::Warning => self.warning_penalty,
            Severity::Info => self.info_penalty,
        }
    }
}

/// A full audit rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Industry profile label shown in reports.
    #[serde(default = "default_industry")]
    pub industry: String,
    /// Rule id → rule configuration, in evaluation order.
    pub rules: IndexMap<String, RuleConfig>,
    /// Logical field key → actual column label. Unmapped keys fall back
    /// to the key itself.
    #[serde(default)]
    pub field_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub scoring: Scoring,
}

fn default_industry() -> String {
    "general retail".to_string()
}

/// Bundled default rule set (general retail thresholds).
const DEFAULT_CONFIG_YAML: &str = include_str!("../../../configs/retail_default.yaml");

impl AuditConfig {
    /// The embedded default rule set.
    pub fn default_config() -> Self {
        serde_yaml::from_str(DEFAULT_CONFIG_YAML)
            .expect("bundled default audit config must parse")
    }

    /// Load a rule set from a YAML file.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Translate a logical field key to the configured column label.
    pub fn field_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.field_mapping.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Numeric field accessor through the mapping. `None` when the field
    /// is absent or not number-like; callers skip the rule in that case.
    pub fn num_field(&self, store: &Fields, key: &str) -> Option<f64> {
        store.get(self.field_label(key))?.coerce_number()
    }

    /// Text field accessor through the mapping.
    pub fn text_field(&self, store: &Fields, key: &str) -> Option<String> {
        store.get(self.field_label(key)).and_then(Value::as_text)
    }

    /// Count of enabled rules.
    pub fn enabled_rules(&self) -> usize {
        self.rules.values().filter(|r| r.enabled).count()
    }
}

impl RuleConfig {
    /// Threshold lookup with a checker-provided default.
    pub fn threshold(&self, key: &str, default: f64) -> f64 {
        self.thresholds.get(key).copied().unwrap_or(default)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_config() {
        let cfg = AuditConfig::default_config();
        assert!(cfg.rules.len() >= 7);
        assert!(cfg.rules.contains_key("sell_through_high"));
        assert_eq!(cfg.rules["sell_through_high"].level, Severity::Critical);
        assert!(cfg.enabled_rules() > 0);
    }

    #[test]
    fn severity_orders_ascending() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn parse_minimal_rule_yaml() {
        let yaml = r#"
industry: test
rules:
  negative_inventory:
    level: critical
    name: Negative inventory
"#;
        let cfg: AuditConfig = serde_yaml::from_str(yaml).unwrap();
        let rule = &cfg.rules["negative_inventory"];
        assert!(rule.enabled, "enabled defaults to true");
        assert!(rule.thresholds.is_empty());
        assert_eq!(cfg.scoring.critical_penalty, 25.0);
    }

    #[test]
    fn field_label_falls_back_to_key() {
        let cfg = AuditConfig::default_config();
        assert_eq!(cfg.field_label("no_such_mapping"), "no_such_mapping");
        // The bundled mapping translates logical keys to column labels.
        assert_ne!(cfg.field_label("store_name"), "store_name");
    }

    #[test]
    fn num_field_coerces_strings() {
        let cfg: AuditConfig = serde_yaml::from_str(
            "industry: t\nrules: {}\nfield_mapping: {sold: Sold Qty}\n",
        )
        .unwrap();
        let mut store = Fields::new();
        store.insert("Sold Qty".to_string(), Value::String("12".into()));
        assert_eq!(cfg.num_field(&store, "sold"), Some(12.0));
        assert_eq!(cfg.num_field(&store, "missing"), None);
    }

    #[test]
    fn threshold_default_applies() {
        let rule = RuleConfig {
            enabled: true,
            level: Severity::Warning,
            name: "t".into(),
            description: String::new(),
            thresholds: IndexMap::new(),
        };
        assert_eq!(rule.threshold("anything", 0.5), 0.5);
    }
}
