use pol_catalog::{InMemoryCatalog, PolicyCatalog};
use pol_reorder::*;

/// A catalog in scrambled order with unmanaged entities mixed in.
fn scrambled(domain: PolicyDomain) -> InMemoryCatalog {
    let mut cat = InMemoryCatalog::new(domain);
    cat.seed_section("s-x", "Unmanaged").unwrap();
    cat.seed_section("s-c", "C").unwrap();
    cat.seed_section("s-a", "A").unwrap();
    cat.seed_section("s-b", "B").unwrap();
    cat.seed_rule("s-x", "u-1", "legacy-1", "", true).unwrap();
    cat.seed_rule("s-a", "r-5", "r5", "", true).unwrap();
    cat.seed_rule("s-a", "u-2", "legacy-2", "", true).unwrap();
    cat.seed_rule("s-c", "r-1", "r1", "", true).unwrap();
    cat.seed_rule("s-b", "r-3", "r3", "", true).unwrap();
    cat.seed_rule("s-b", "r-2", "r2", "", true).unwrap();
    cat.seed_rule("s-c", "r-4", "r4", "", true).unwrap();
    cat
}

fn desired() -> DesiredTopology {
    DesiredTopology::new()
        .section("A", 1)
        .section("B", 2)
        .section("C", 3)
        .rule("r1", "A", 1)
        .rule("r2", "A", 2)
        .rule("r3", "A", 3)
        .rule("r4", "B", 1)
        .rule("r5", "C", 1)
}

#[test]
fn scenario_reconcile_converges_in_every_domain() {
    for domain in PolicyDomain::ALL {
        let mut cat = scrambled(domain);
        let d = desired();
        reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();

        let observed = read_back(&cat, Some(&d)).unwrap();
        for r in &d.rules {
            let got = observed.rule(&r.name).unwrap();
            assert_eq!(got.section_name, r.section_name, "{domain}: {}", r.name);
            assert_eq!(got.index_in_section, r.index_in_section, "{domain}: {}", r.name);
        }
        for s in &d.sections {
            assert_eq!(
                observed.section(&s.name).map(|o| o.section_index),
                Some(s.section_index),
                "{domain}: {}",
                s.name
            );
        }
        assert!(detect_drift(&d, &observed).unwrap().is_clean());
        assert!(!cat.has_unpublished_changes());
    }
}

#[test]
fn scenario_unmanaged_entities_are_left_where_they_were() {
    let mut cat = scrambled(PolicyDomain::WanFirewall);
    reconcile(&mut cat, &desired(), &ReorderOptions::default()).unwrap();

    let sections: Vec<String> = cat
        .published_sections()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(sections, vec!["Unmanaged", "A", "B", "C"]);

    // legacy-2 was in A and is not managed: it trails the managed rules.
    let a_rules: Vec<String> = cat
        .published_rules()
        .into_iter()
        .filter(|r| r.section_name == "A")
        .map(|r| r.name)
        .collect();
    assert_eq!(a_rules, vec!["r1", "r2", "r3", "legacy-2"]);
}

#[test]
fn scenario_second_run_reissues_moves_without_changing_state() {
    let mut cat = scrambled(PolicyDomain::WanNetwork);
    let d = desired();
    reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();
    let once_sections = cat.published_sections();
    let once_rules = cat.published_rules();

    cat.clear_journal();
    let second = reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();

    assert_eq!(cat.published_sections(), once_sections);
    assert_eq!(cat.published_rules(), once_rules);
    // Every move is re-issued; this is not a minimal diff.
    assert_eq!(second.plan.section_moves(), 3);
    assert_eq!(second.plan.rule_moves(), 5);
    assert_eq!(cat.journal().len(), 3 + 5 + 1);
    assert_eq!(cat.revision(), 2);
}

#[test]
fn scenario_recompute_inverts_the_sequencers() {
    let mut cat = scrambled(PolicyDomain::InternetFirewall);
    let d = desired();
    reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();

    let rules = cat.list_rules().unwrap();
    let indices = recompute_indices(&rules);
    let ordered = order_topology(&d).unwrap();
    for (rule, idx) in rules.iter().zip(indices) {
        if let Some((section, want)) = ordered.rule_position(&rule.name) {
            assert_eq!(rule.section_name, section);
            assert_eq!(idx, want, "{}", rule.name);
        }
    }
}

#[test]
fn scenario_sparse_indices_converge_to_dense_positions() {
    let mut cat = scrambled(PolicyDomain::InternetFirewall);
    let d = DesiredTopology::new()
        .section("C", 300)
        .section("A", 100)
        .rule("r4", "C", 70)
        .rule("r1", "C", 10);
    reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();

    let observed = read_back(&cat, Some(&d)).unwrap();
    assert_eq!(observed.section("A").map(|s| s.section_index), Some(1));
    assert_eq!(observed.section("C").map(|s| s.section_index), Some(2));
    assert_eq!(observed.rule("r1").map(|r| r.index_in_section), Some(1));
    assert_eq!(observed.rule("r4").map(|r| r.index_in_section), Some(2));
    assert!(detect_drift(&d, &observed).unwrap().is_clean());
}
