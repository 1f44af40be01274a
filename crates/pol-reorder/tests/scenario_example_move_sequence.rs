use pol_catalog::{CatalogCall, InMemoryCatalog, RulePosition, SectionPosition};
use pol_reorder::*;

fn catalog() -> InMemoryCatalog {
    let mut cat = InMemoryCatalog::new(PolicyDomain::InternetFirewall);
    cat.seed_section("s-head", "Head").unwrap();
    cat.seed_section("s-b", "B").unwrap();
    cat.seed_section("s-a", "A").unwrap();
    cat.seed_rule("s-b", "id-r2", "r2", "", true).unwrap();
    cat.seed_rule("s-b", "id-r1", "r1", "", true).unwrap();
    cat.seed_rule("s-a", "id-r3", "r3", "", false).unwrap();
    cat
}

fn desired() -> DesiredTopology {
    DesiredTopology::new()
        .section("A", 1)
        .section("B", 2)
        .rule("r1", "A", 1)
        .rule("r2", "A", 2)
        .rule("r3", "B", 1)
}

#[test]
fn scenario_example_topology_issues_the_documented_call_chain() {
    let mut cat = catalog();
    let outcome = reconcile(&mut cat, &desired(), &ReorderOptions::default()).unwrap();

    assert_eq!(
        cat.journal(),
        &[
            CatalogCall::MoveSection {
                id: "s-a".to_string(),
                to: SectionPosition::AfterSection("s-head".to_string()),
            },
            CatalogCall::MoveSection {
                id: "s-b".to_string(),
                to: SectionPosition::AfterSection("s-a".to_string()),
            },
            CatalogCall::MoveRule {
                id: "id-r1".to_string(),
                to: RulePosition::FirstInSection("s-a".to_string()),
            },
            CatalogCall::MoveRule {
                id: "id-r2".to_string(),
                to: RulePosition::AfterRule("id-r1".to_string()),
            },
            CatalogCall::MoveRule {
                id: "id-r3".to_string(),
                to: RulePosition::FirstInSection("s-b".to_string()),
            },
            CatalogCall::Publish { revision: 1 },
        ]
    );
    assert_eq!(outcome.calls_issued, 6);
    assert!(outcome.published);
    assert_eq!(outcome.bootstrapped_section, None);
    assert_eq!(
        outcome.plan.anchor,
        Anchor::Existing {
            id: "s-head".to_string(),
            name: "Head".to_string()
        }
    );
}

#[test]
fn scenario_example_topology_reads_back_declared_indices() {
    let mut cat = catalog();
    let d = desired();
    reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();

    let observed = read_back(&cat, Some(&d)).unwrap();
    let index = |name: &str| observed.rule(name).map(|r| r.index_in_section);
    assert_eq!(index("r1"), Some(1));
    assert_eq!(index("r2"), Some(2));
    assert_eq!(index("r3"), Some(1));
    assert_eq!(observed.rule("r1").map(|r| r.section_name.as_str()), Some("A"));
    assert_eq!(observed.rule("r3").map(|r| r.enabled), Some(false));

    assert_eq!(observed.section("A").map(|s| s.section_index), Some(1));
    assert_eq!(observed.section("B").map(|s| s.section_index), Some(2));
    assert!(observed.section("Head").is_none());
}

#[test]
fn scenario_plan_renders_dry_run() {
    let cat = catalog();
    let p = plan(&cat, &desired(), &ReorderOptions::default()).unwrap();
    let text = p.to_string();

    assert!(text.starts_with("domain=internet_firewall anchor=existing 'Head' (s-head)"));
    assert!(text.contains("moveSection 'A' (s-a) AFTER_SECTION 'Head' (s-head)"));
    assert!(text.contains("moveRule 'r2' (id-r2) AFTER_RULE 'r1' (id-r1)"));
    assert!(text.trim_end().ends_with("publishRevision"));
}
