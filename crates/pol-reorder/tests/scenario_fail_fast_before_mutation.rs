use pol_catalog::{CallKind, CatalogError, InMemoryCatalog};
use pol_reorder::*;

fn catalog() -> InMemoryCatalog {
    let mut cat = InMemoryCatalog::new(PolicyDomain::WanFirewall);
    cat.seed_section("s-1", "A").unwrap();
    cat.seed_section("s-2", "B").unwrap();
    cat.seed_rule("s-1", "r-1", "r1", "", true).unwrap();
    cat.seed_rule("s-2", "r-2", "r2", "", true).unwrap();
    cat
}

#[test]
fn scenario_unknown_names_abort_before_any_move() {
    let mut cat = catalog();
    let desired = DesiredTopology::new()
        .section("A", 1)
        .section("Ghost", 2)
        .rule("r1", "A", 1)
        .rule("phantom", "A", 2);

    let err = reconcile(&mut cat, &desired, &ReorderOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ReorderError::UnresolvedNames(ResolutionReport {
            missing_sections: vec!["Ghost".to_string()],
            missing_rules: vec!["phantom".to_string()],
            ..Default::default()
        })
    );
    assert!(cat.journal().is_empty());
    assert_eq!(cat.call_count(CallKind::MoveSection), 0);
    assert_eq!(cat.call_count(CallKind::MoveRule), 0);
    assert_eq!(cat.call_count(CallKind::Publish), 0);
}

#[test]
fn scenario_unknown_explicit_anchor_aborts_before_any_move() {
    let mut cat = catalog();
    let desired = DesiredTopology::new().with_anchor("s-404").section("A", 1);

    let err = reconcile(&mut cat, &desired, &ReorderOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ReorderError::AnchorNotFound {
            id: "s-404".to_string()
        }
    );
    assert!(cat.journal().is_empty());
}

#[test]
fn scenario_managed_anchor_is_refused() {
    let mut cat = catalog();
    let desired = DesiredTopology::new()
        .with_anchor("s-2")
        .section("A", 1)
        .section("B", 2);

    let err = reconcile(&mut cat, &desired, &ReorderOptions::default()).unwrap_err();
    assert!(matches!(err, ReorderError::AnchorIsManaged { ref id, .. } if id == "s-2"));
    assert!(cat.journal().is_empty());
}

#[test]
fn scenario_malformed_topology_never_lists_the_catalog() {
    let mut cat = catalog();
    let desired = DesiredTopology::new()
        .section("A", 1)
        .rule("r1", "A", 1)
        .rule("r1", "A", 2);

    let err = reconcile(&mut cat, &desired, &ReorderOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ReorderError::InvalidTopology {
            issues: vec![TopologyIssue::DuplicateRule {
                name: "r1".to_string(),
                section: "A".to_string()
            }]
        }
    );
    assert_eq!(cat.call_count(CallKind::ListSections), 0);
}

#[test]
fn scenario_list_failure_is_reported_as_list_step() {
    let mut cat = catalog();
    cat.fail_on(
        CallKind::ListRules,
        1,
        CatalogError::Transport("connection reset".to_string()),
    );

    let err = reconcile(
        &mut cat,
        &DesiredTopology::new().section("A", 1),
        &ReorderOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ReorderError::Catalog {
            step: Step::ListRules,
            completed: 0,
            source: CatalogError::Transport("connection reset".to_string()),
        }
    );
    assert!(cat.journal().is_empty());
}
