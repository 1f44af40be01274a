//! Name → id resolution against a fresh catalog snapshot.
//!
//! The index is rebuilt at the start of every reconciliation and never kept:
//! ids change whenever an entity is recreated outside this engine.

use std::collections::{BTreeMap, BTreeSet};

use pol_catalog::{CatalogRule, CatalogSection, PolicyCatalog};

use crate::{OrderedTopology, ReorderError, ResolutionReport, Step};

/// Outcome of a single name lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a str),
    Missing,
    /// The name matches `n > 1` catalog entities.
    Ambiguous(usize),
}

impl<'a> Lookup<'a> {
    pub fn id(&self) -> Option<&'a str> {
        match *self {
            Lookup::Found(id) => Some(id),
            _ => None,
        }
    }
}

fn lookup<'a>(map: &'a BTreeMap<String, Vec<String>>, name: &str) -> Lookup<'a> {
    match map.get(name).map(|ids| ids.as_slice()) {
        None | Some([]) => Lookup::Missing,
        Some([id]) => Lookup::Found(id.as_str()),
        Some(ids) => Lookup::Ambiguous(ids.len()),
    }
}

/// A catalog rule id with the section it currently sits in.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RuleEntry {
    id: String,
    section_name: String,
}

/// Name → id maps for sections and rules, plus the catalog's current section
/// order (needed to choose a default anchor).
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    sections: BTreeMap<String, Vec<String>>,
    rules: BTreeMap<String, Vec<RuleEntry>>,
    section_order: Vec<CatalogSection>,
}

impl NameIndex {
    /// Build the index from a catalog snapshot (`listSections` + `listRules`).
    pub fn from_catalog<C: PolicyCatalog + ?Sized>(catalog: &C) -> Result<Self, ReorderError> {
        let sections = catalog
            .list_sections()
            .map_err(|e| ReorderError::catalog(Step::ListSections, 0, e))?;
        let rules = catalog
            .list_rules()
            .map_err(|e| ReorderError::catalog(Step::ListRules, 0, e))?;
        Ok(Self::from_parts(&sections, &rules))
    }

    pub fn from_parts(sections: &[CatalogSection], rules: &[CatalogRule]) -> Self {
        let mut index = NameIndex {
            section_order: sections.to_vec(),
            ..Default::default()
        };
        for s in sections {
            index
                .sections
                .entry(s.name.clone())
                .or_default()
                .push(s.id.clone());
        }
        for r in rules {
            index.rules.entry(r.name.clone()).or_default().push(RuleEntry {
                id: r.id.clone(),
                section_name: r.section_name.clone(),
            });
        }
        index
    }

    pub fn section_id(&self, name: &str) -> Lookup<'_> {
        lookup(&self.sections, name)
    }

    /// Policy-wide lookup, ignoring sections.
    pub fn rule_id(&self, name: &str) -> Lookup<'_> {
        match self.rules.get(name).map(|e| e.as_slice()) {
            None | Some([]) => Lookup::Missing,
            Some([e]) => Lookup::Found(e.id.as_str()),
            Some(es) => Lookup::Ambiguous(es.len()),
        }
    }

    /// Lookup of a rule wanted in `section`.
    ///
    /// A rule of that name already in `section` wins. Otherwise the candidates
    /// are the rules of that name sitting outside every section in `claimed`
    /// (the target sections that list the name), and exactly one must remain.
    pub fn rule_id_in(&self, section: &str, name: &str, claimed: &BTreeSet<&str>) -> Lookup<'_> {
        let entries = self.rules.get(name).map(|e| e.as_slice()).unwrap_or(&[]);

        let in_section: Vec<&RuleEntry> =
            entries.iter().filter(|e| e.section_name == section).collect();
        match in_section.as_slice() {
            [e] => return Lookup::Found(e.id.as_str()),
            [] => {}
            many => return Lookup::Ambiguous(many.len()),
        }

        let unclaimed: Vec<&RuleEntry> = entries
            .iter()
            .filter(|e| !claimed.contains(e.section_name.as_str()))
            .collect();
        match unclaimed.as_slice() {
            [] => Lookup::Missing,
            [e] => Lookup::Found(e.id.as_str()),
            many => Lookup::Ambiguous(many.len()),
        }
    }

    /// Catalog sections in their current (pre-reconciliation) chain order.
    pub fn sections(&self) -> &[CatalogSection] {
        &self.section_order
    }

    pub fn section_by_id(&self, id: &str) -> Option<&CatalogSection> {
        self.section_order.iter().find(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.section_order.is_empty()
    }

    /// Map every name in `ordered` to its id.
    ///
    /// Fails with a single aggregated [`ReorderError::UnresolvedNames`] listing
    /// every missing or ambiguous name; never returns a partial result.
    pub fn resolve(&self, ordered: &OrderedTopology) -> Result<ResolvedTopology, ReorderError> {
        let mut report = ResolutionReport::default();
        let mut sections = Vec::with_capacity(ordered.sections.len());

        for s in &ordered.sections {
            let section_id = match self.section_id(&s.name) {
                Lookup::Found(id) => Some(id.to_string()),
                Lookup::Missing => {
                    report.missing_sections.push(s.name.clone());
                    None
                }
                Lookup::Ambiguous(_) => {
                    report.ambiguous_sections.push(s.name.clone());
                    None
                }
            };

            let mut rules = Vec::with_capacity(s.rules.len());
            for r in &s.rules {
                let claimed = ordered.sections_with_rule(r);
                match self.rule_id_in(&s.name, r, &claimed) {
                    Lookup::Found(id) => rules.push(ResolvedRule {
                        name: r.clone(),
                        id: id.to_string(),
                    }),
                    Lookup::Missing => report.missing_rules.push(r.clone()),
                    Lookup::Ambiguous(_) => report.ambiguous_rules.push(r.clone()),
                }
            }

            if let Some(id) = section_id {
                sections.push(ResolvedSection {
                    name: s.name.clone(),
                    id,
                    rules,
                });
            }
        }

        let report = report.finish();
        if !report.is_clean() {
            return Err(ReorderError::UnresolvedNames(report));
        }
        Ok(ResolvedTopology { sections })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRule {
    pub name: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSection {
    pub name: String,
    pub id: String,
    pub rules: Vec<ResolvedRule>,
}

/// Ordered topology with every name bound to a catalog id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedTopology {
    pub sections: Vec<ResolvedSection>,
}

impl ResolvedTopology {
    pub fn manages_section_id(&self, id: &str) -> bool {
        self.sections.iter().any(|s| s.id == id)
    }

    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }
}
