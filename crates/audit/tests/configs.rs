//! Integration tests that verify every bundled audit config in `configs/`
//! deserializes correctly against the schema.

use baseops_audit::{AuditConfig, Severity};

/// Resolve the configs directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn configs_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../configs")
}

fn audit_config_paths() -> Vec<std::path::PathBuf> {
    std::fs::read_dir(configs_dir())
        .expect("configs/ directory must exist")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .filter(|p| {
            // Schedule files use a different schema.
            !p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("schedule"))
        })
        .collect()
}

#[test]
fn every_bundled_audit_config_parses() {
    let paths = audit_config_paths();
    assert!(!paths.is_empty(), "no audit configs found in configs/");
    for path in paths {
        let cfg = AuditConfig::load(&path)
            .unwrap_or_else(|e| panic!("{} failed to parse: {e}", path.display()));
        assert!(
            !cfg.rules.is_empty(),
            "{} declares no rules",
            path.display()
        );
    }
}

#[test]
fn default_config_thresholds_are_sane() {
    let cfg = AuditConfig::default_config();

    let high = &cfg.rules["sell_through_high"];
    assert_eq!(high.level, Severity::Critical);
    assert!(high.threshold("sell_through_min", 0.0) > 0.0);
    assert!(high.threshold("days_left_max", 0.0) > 0.0);

    let low = &cfg.rules["sell_through_low"];
    assert_eq!(low.level, Severity::Warning);
    // The "low" ceiling must sit below the "high" floor.
    assert!(
        low.threshold("sell_through_max", 1.0) < high.threshold("sell_through_min", 0.0)
    );

    assert!(cfg.scoring.critical_penalty > cfg.scoring.warning_penalty);
    assert!(cfg.scoring.warning_penalty > cfg.scoring.info_penalty);
}

#[test]
fn every_configured_rule_has_a_registered_checker() {
    let cfg = AuditConfig::default_config();
    for rule_id in cfg.rules.keys() {
        assert!(
            baseops_audit::checkers::checker(rule_id).is_some(),
            "rule '{rule_id}' has no checker"
        );
    }
}
