//! Read-side index recomputation.
//!
//! The catalog never reports a rule's position inside its section, only a
//! globally ordered rule list. Positions are rebuilt here from that order so
//! that persisted state can be compared with the desired indices.

use std::collections::{BTreeMap, BTreeSet};

use pol_catalog::{CatalogRule, CatalogSection, PolicyCatalog};

use crate::{
    DesiredTopology, ObservedRule, ObservedSection, ObservedTopology, ReorderError, Step,
};

/// 1-based position of each rule within its section, given `rules` in the
/// catalog's global order. Output is parallel to the input.
///
/// Counters are keyed by section id, so two sections sharing a name do not
/// share a counter.
pub fn recompute_indices(rules: &[CatalogRule]) -> Vec<i64> {
    let mut counters: BTreeMap<&str, i64> = BTreeMap::new();
    rules
        .iter()
        .map(|r| {
            let n = counters.entry(r.section_id.as_str()).or_insert(0);
            *n += 1;
            *n
        })
        .collect()
}

/// Shape a catalog listing into [`ObservedTopology`].
///
/// Section indices are 1-based over the reported sections. When `managed` is
/// given, only the sections and rules it names are reported; rule indices are
/// still counted over every rule of the section, managed or not.
pub fn observe(
    sections: &[CatalogSection],
    rules: &[CatalogRule],
    managed: Option<&DesiredTopology>,
) -> ObservedTopology {
    let section_filter: Option<BTreeSet<&str>> =
        managed.map(|d| d.sections.iter().map(|s| s.name.as_str()).collect());
    let rule_filter: Option<BTreeSet<&str>> =
        managed.map(|d| d.rules.iter().map(|r| r.name.as_str()).collect());

    let observed_sections = sections
        .iter()
        .filter(|s| {
            section_filter
                .as_ref()
                .map_or(true, |f| f.contains(s.name.as_str()))
        })
        .enumerate()
        .map(|(i, s)| ObservedSection {
            id: s.id.clone(),
            name: s.name.clone(),
            section_index: i as i64 + 1,
        })
        .collect();

    let observed_rules = rules
        .iter()
        .zip(recompute_indices(rules))
        .filter(|(r, _)| {
            rule_filter
                .as_ref()
                .map_or(true, |f| f.contains(r.name.as_str()))
        })
        .map(|(r, index_in_section)| ObservedRule {
            id: r.id.clone(),
            name: r.name.clone(),
            section_name: r.section_name.clone(),
            index_in_section,
            description: r.description.clone(),
            enabled: r.enabled,
        })
        .collect();

    ObservedTopology {
        sections: observed_sections,
        rules: observed_rules,
    }
}

/// List the catalog and recompute persisted state.
pub fn read_back<C: PolicyCatalog + ?Sized>(
    catalog: &C,
    managed: Option<&DesiredTopology>,
) -> Result<ObservedTopology, ReorderError> {
    let sections = catalog
        .list_sections()
        .map_err(|e| ReorderError::catalog(Step::ListSections, 0, e))?;
    let rules = catalog
        .list_rules()
        .map_err(|e| ReorderError::catalog(Step::ListRules, 0, e))?;
    Ok(observe(&sections, &rules, managed))
}
