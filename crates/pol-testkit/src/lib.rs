//! pol-testkit
//!
//! Fixture builders shared by the cross-crate scenario tests: catalogs in a
//! known (or deterministically scrambled) order and the topologies that
//! reorder them.

use anyhow::{bail, Context, Result};
use pol_catalog::snapshot_adapter::{self, RawCatalogSnapshot};
use pol_catalog::{InMemoryCatalog, PolicyDomain};
use pol_reorder::{detect_drift, read_back, DesiredTopology};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;

pub fn load_catalog_snapshot_json(path: &str) -> Result<InMemoryCatalog> {
    let s = fs::read_to_string(path).with_context(|| format!("read snapshot: {path}"))?;
    let raw: RawCatalogSnapshot = serde_json::from_str(&s).context("parse snapshot json")?;
    snapshot_adapter::normalize(raw).context("normalize snapshot")
}

/// Builder for an [`InMemoryCatalog`] with pre-existing published content.
pub struct CatalogFixture {
    catalog: InMemoryCatalog,
    last_section: Option<String>,
}

impl CatalogFixture {
    pub fn new(domain: PolicyDomain) -> Self {
        Self {
            catalog: InMemoryCatalog::new(domain),
            last_section: None,
        }
    }

    /// Append a section; following `rule` calls go into it.
    pub fn section(mut self, id: &str, name: &str) -> Result<Self> {
        self.catalog.seed_section(id, name)?;
        self.last_section = Some(id.to_string());
        Ok(self)
    }

    /// Append an enabled rule to the most recently added section.
    pub fn rule(mut self, id: &str, name: &str) -> Result<Self> {
        let Some(section) = self.last_section.clone() else {
            bail!("rule '{name}' added before any section");
        };
        self.catalog.seed_rule(&section, id, name, "", true)?;
        Ok(self)
    }

    pub fn build(self) -> InMemoryCatalog {
        self.catalog
    }
}

/// A catalog holding `sections` sections of `rules_per_section` rules each,
/// with sections and rule placement scrambled by `seed`, plus one unmanaged
/// section (`Unmanaged`, holding rule `legacy`) somewhere in the chain.
///
/// Section `S{i}` has id `sid-{i}`; rule `R{i}.{j}` has id `rid-{i}-{j}`.
pub fn scrambled_catalog(
    domain: PolicyDomain,
    sections: usize,
    rules_per_section: usize,
    seed: u64,
) -> Result<InMemoryCatalog> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut section_order: Vec<Option<usize>> = (0..sections).map(Some).collect();
    section_order.push(None);
    section_order.shuffle(&mut rng);

    let mut cat = InMemoryCatalog::new(domain);
    for s in &section_order {
        match s {
            Some(i) => cat.seed_section(format!("sid-{i}"), format!("S{i}"))?,
            None => cat.seed_section("sid-unmanaged", "Unmanaged")?,
        }
    }

    // Rules land in arbitrary sections, in arbitrary order.
    let mut rules: Vec<(usize, usize)> = (0..sections)
        .flat_map(|i| (0..rules_per_section).map(move |j| (i, j)))
        .collect();
    rules.shuffle(&mut rng);
    for (n, (i, j)) in rules.iter().enumerate() {
        let host = if sections == 0 {
            "sid-unmanaged".to_string()
        } else {
            format!("sid-{}", n % sections)
        };
        cat.seed_rule(&host, format!("rid-{i}-{j}"), format!("R{i}.{j}"), "", true)?;
    }
    cat.seed_rule("sid-unmanaged", "rid-legacy", "legacy", "", true)?;

    Ok(cat)
}

/// Topology over the entities of [`scrambled_catalog`]: sections in an order
/// derived from `seed`, each section's rules in an order derived from `seed`.
/// Indices are sparse (multiples of 10) to exercise ordering, not density.
pub fn shuffled_topology(sections: usize, rules_per_section: usize, seed: u64) -> DesiredTopology {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
    let mut desired = DesiredTopology::new();

    let mut order: Vec<usize> = (0..sections).collect();
    order.shuffle(&mut rng);
    for (pos, i) in order.iter().enumerate() {
        desired = desired.section(format!("S{i}"), (pos as i64 + 1) * 10);
    }

    for i in 0..sections {
        let mut rule_order: Vec<usize> = (0..rules_per_section).collect();
        rule_order.shuffle(&mut rng);
        for (pos, j) in rule_order.iter().enumerate() {
            desired = desired.rule(format!("R{i}.{j}"), format!("S{i}"), (pos as i64 + 1) * 10);
        }
    }
    desired
}

/// Read the catalog back and fail with the drift list unless it matches.
pub fn assert_converged(catalog: &InMemoryCatalog, desired: &DesiredTopology) -> Result<()> {
    let observed = read_back(catalog, Some(desired))?;
    let drift = detect_drift(desired, &observed)?;
    if !drift.is_clean() {
        bail!("catalog drifted from desired topology:\n{drift}");
    }
    Ok(())
}
