use pol_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

const YAML: &str = r#"
catalog:
  domain: "wan_firewall"
reorder:
  publish: true
  start_anchor_id: "sec-0001"
legacy:
  batch_size: 50
  dry: true
"#;

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Plan, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.mode, "PLAN");
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/legacy/batch_size".to_string(),
            "/legacy/dry".to_string(),
        ]
    );
}

#[test]
fn fail_mode_errors_with_deterministic_message() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(ConfigMode::Apply, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("CONFIG_UNUSED_KEYS (mode=APPLY): 2 unused"), "got: {msg}");
    assert!(msg.contains("/legacy/batch_size"));
}

#[test]
fn read_mode_consumes_the_domain_and_start_anchor() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Read, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    let unused = &report.unused_leaf_pointers;
    assert!(!unused.contains(&"/catalog/domain".to_string()));
    // `read --topology` applies the configured anchor to the topology.
    assert!(!unused.contains(&"/reorder/start_anchor_id".to_string()));
    assert!(unused.contains(&"/reorder/publish".to_string()));
}

#[test]
fn publish_mode_only_consumes_the_domain() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Publish, &loaded.config_json, UnusedKeyPolicy::Warn)
            .unwrap();
    assert_eq!(report.mode, "PUBLISH");
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/legacy/batch_size".to_string(),
            "/legacy/dry".to_string(),
            "/reorder/publish".to_string(),
            "/reorder/start_anchor_id".to_string(),
        ]
    );
}

#[test]
fn fully_consumed_config_is_clean_in_fail_mode() {
    let yaml = r#"
catalog:
  domain: "wan_network"
reorder:
  default_section_name: "Baseline"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Plan, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
