use pol_catalog::snapshot_adapter::{normalize, snapshot};
use pol_catalog::PolicyDomain;
use pol_reorder::{read_back, reconcile, DesiredTopology, ReorderOptions};
use pol_testkit::{assert_converged, load_catalog_snapshot_json, CatalogFixture};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn desired() -> DesiredTopology {
    DesiredTopology::new()
        .section("Datacenter", 1)
        .section("Branches", 2)
        .rule("deny-all", "Datacenter", 1)
        .rule("allow-icmp", "Branches", 1)
        .rule("allow-ssh", "Branches", 2)
}

#[test]
fn scenario_fixture_snapshot_reconciles_and_survives_a_reload() {
    let mut cat = load_catalog_snapshot_json(&fixture("wan_firewall_snapshot.json")).unwrap();
    assert_eq!(cat.revision(), 7);

    let d = desired();
    reconcile(&mut cat, &d, &ReorderOptions::default()).unwrap();
    assert_converged(&cat, &d).unwrap();
    assert_eq!(cat.revision(), 8);

    // Persist, reload, and read the same state.
    let reloaded = normalize(snapshot(&cat)).unwrap();
    assert_eq!(
        read_back(&reloaded, None).unwrap(),
        read_back(&cat, None).unwrap()
    );
    assert_converged(&reloaded, &d).unwrap();
}

#[test]
fn scenario_staged_draft_survives_a_reload() {
    let mut cat = CatalogFixture::new(PolicyDomain::WanNetwork)
        .section("s-1", "Branches")
        .unwrap()
        .rule("r-1", "allow-ssh")
        .unwrap()
        .rule("r-2", "allow-icmp")
        .unwrap()
        .section("s-2", "Datacenter")
        .unwrap()
        .rule("r-3", "deny-all")
        .unwrap()
        .build();

    let opts = ReorderOptions {
        publish: false,
        ..Default::default()
    };
    reconcile(&mut cat, &desired(), &opts).unwrap();
    assert!(cat.has_unpublished_changes());

    let reloaded = normalize(snapshot(&cat)).unwrap();
    assert!(reloaded.has_unpublished_changes());
    assert_eq!(reloaded.staged_rules(), cat.staged_rules());
    assert_eq!(reloaded.published_rules(), cat.published_rules());
    assert_converged(&reloaded, &desired()).unwrap();
}
