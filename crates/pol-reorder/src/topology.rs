//! Validation and ordering of a [`DesiredTopology`].
//!
//! Output order depends only on the caller's indices and, for equal indices,
//! on input order (stable sort). Map iteration order never leaks into it.

use std::collections::BTreeSet;

use tracing::warn;

use crate::{DesiredTopology, ReorderError, TopologyIssue};

/// A managed section and its managed rules, both in target order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedSection {
    pub name: String,
    pub rules: Vec<String>,
}

/// Desired topology after validation and sorting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderedTopology {
    pub sections: Vec<OrderedSection>,
}

impl OrderedTopology {
    /// 1-based target position of a section.
    pub fn section_position(&self, name: &str) -> Option<i64> {
        self.sections
            .iter()
            .position(|s| s.name == name)
            .map(|p| p as i64 + 1)
    }

    /// (section name, 1-based target position in that section) of a rule.
    /// For a name used in several sections, the first section in target order.
    pub fn rule_position(&self, name: &str) -> Option<(&str, i64)> {
        self.sections.iter().find_map(|s| {
            s.rules
                .iter()
                .position(|r| r == name)
                .map(|p| (s.name.as_str(), p as i64 + 1))
        })
    }

    /// Target sections that list a rule called `name`.
    pub fn sections_with_rule(&self, name: &str) -> BTreeSet<&str> {
        self.sections
            .iter()
            .filter(|s| s.rules.iter().any(|r| r == name))
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }
}

fn collect_issues(desired: &DesiredTopology) -> Vec<TopologyIssue> {
    let mut issues = Vec::new();

    let mut sections: BTreeSet<&str> = BTreeSet::new();
    for (position, s) in desired.sections.iter().enumerate() {
        if s.name.trim().is_empty() {
            issues.push(TopologyIssue::EmptySectionName { position });
        } else if !sections.insert(s.name.as_str()) {
            issues.push(TopologyIssue::DuplicateSection {
                name: s.name.clone(),
            });
        }
    }

    // Rule names are unique per section, not per policy.
    let mut rules: BTreeSet<(&str, &str)> = BTreeSet::new();
    for (position, r) in desired.rules.iter().enumerate() {
        if r.name.trim().is_empty() {
            issues.push(TopologyIssue::EmptyRuleName { position });
            continue;
        }
        if !rules.insert((r.section_name.as_str(), r.name.as_str())) {
            issues.push(TopologyIssue::DuplicateRule {
                name: r.name.clone(),
                section: r.section_name.clone(),
            });
        }
        if !sections.contains(r.section_name.as_str()) {
            issues.push(TopologyIssue::UndeclaredSection {
                rule: r.name.clone(),
                section: r.section_name.clone(),
            });
        }
    }

    issues.sort();
    issues.dedup();
    issues
}

fn warn_on_ties(kind: &str, scope: &str, indices: &[(i64, &str)]) {
    for w in indices.windows(2) {
        if w[0].0 == w[1].0 {
            warn!(
                kind,
                scope,
                index = w[0].0,
                first = w[0].1,
                second = w[1].1,
                "equal ordering index; keeping input order"
            );
        }
    }
}

/// Validate `desired` and sort it into target order.
///
/// All issues are collected and reported together.
pub fn order_topology(desired: &DesiredTopology) -> Result<OrderedTopology, ReorderError> {
    let issues = collect_issues(desired);
    if !issues.is_empty() {
        return Err(ReorderError::InvalidTopology { issues });
    }

    let mut sections: Vec<_> = desired.sections.iter().collect();
    sections.sort_by_key(|s| s.section_index);
    let keyed: Vec<(i64, &str)> = sections
        .iter()
        .map(|s| (s.section_index, s.name.as_str()))
        .collect();
    warn_on_ties("section", "policy", &keyed);

    let mut out = Vec::with_capacity(sections.len());
    for s in sections {
        let mut rules: Vec<_> = desired
            .rules
            .iter()
            .filter(|r| r.section_name == s.name)
            .collect();
        rules.sort_by_key(|r| r.index_in_section);
        let keyed: Vec<(i64, &str)> = rules
            .iter()
            .map(|r| (r.index_in_section, r.name.as_str()))
            .collect();
        warn_on_ties("rule", &s.name, &keyed);

        out.push(OrderedSection {
            name: s.name.clone(),
            rules: rules.into_iter().map(|r| r.name.clone()).collect(),
        });
    }

    Ok(OrderedTopology { sections: out })
}
