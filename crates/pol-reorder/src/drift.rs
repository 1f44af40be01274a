//! Desired vs. observed comparison.
//!
//! Positions on both sides are dense and 1-based: the desired side uses the
//! ordered topology (so `10, 20, 30` compares as `1, 2, 3`), the observed side
//! is whatever [`crate::read_back`] recomputed.

use std::fmt;

use crate::{order_topology, DesiredTopology, ObservedTopology, ReorderError};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TopologyDiff {
    MissingSection {
        name: String,
    },
    MissingRule {
        name: String,
    },
    SectionOrder {
        name: String,
        expected: i64,
        observed: i64,
    },
    RuleSection {
        name: String,
        expected: String,
        observed: String,
    },
    RuleOrder {
        name: String,
        section: String,
        expected: i64,
        observed: i64,
    },
}

impl fmt::Display for TopologyDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyDiff::MissingSection { name } => write!(f, "section '{name}' not in catalog"),
            TopologyDiff::MissingRule { name } => write!(f, "rule '{name}' not in catalog"),
            TopologyDiff::SectionOrder {
                name,
                expected,
                observed,
            } => write!(
                f,
                "section '{name}' at position {observed}, expected {expected}"
            ),
            TopologyDiff::RuleSection {
                name,
                expected,
                observed,
            } => write!(f, "rule '{name}' in section '{observed}', expected '{expected}'"),
            TopologyDiff::RuleOrder {
                name,
                section,
                expected,
                observed,
            } => write!(
                f,
                "rule '{name}' at position {observed} in '{section}', expected {expected}"
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub diffs: Vec<TopologyDiff>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.diffs.is_empty()
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diffs.is_empty() {
            return f.write_str("in sync");
        }
        for d in &self.diffs {
            writeln!(f, "- {d}")?;
        }
        Ok(())
    }
}

/// Compare `desired` with a read-back taken with `managed = Some(desired)`.
///
/// A read-back of the whole catalog also works for rules, but section
/// positions then count unmanaged sections and will report spurious
/// `SectionOrder` diffs.
pub fn detect_drift(
    desired: &DesiredTopology,
    observed: &ObservedTopology,
) -> Result<DriftReport, ReorderError> {
    let ordered = order_topology(desired)?;
    let mut diffs = Vec::new();

    for (i, s) in ordered.sections.iter().enumerate() {
        let expected = i as i64 + 1;
        match observed.section(&s.name) {
            None => diffs.push(TopologyDiff::MissingSection {
                name: s.name.clone(),
            }),
            Some(o) if o.section_index != expected => diffs.push(TopologyDiff::SectionOrder {
                name: s.name.clone(),
                expected,
                observed: o.section_index,
            }),
            Some(_) => {}
        }

        for (j, r) in s.rules.iter().enumerate() {
            let expected = j as i64 + 1;
            let Some(o) = observed.rule_in(&s.name, r) else {
                // Same-named rules in other target sections belong to those.
                let targets = ordered.sections_with_rule(r);
                match observed
                    .rules
                    .iter()
                    .find(|o| o.name == *r && !targets.contains(o.section_name.as_str()))
                {
                    Some(o) => diffs.push(TopologyDiff::RuleSection {
                        name: r.clone(),
                        expected: s.name.clone(),
                        observed: o.section_name.clone(),
                    }),
                    None => diffs.push(TopologyDiff::MissingRule { name: r.clone() }),
                }
                continue;
            };
            if o.index_in_section != expected {
                diffs.push(TopologyDiff::RuleOrder {
                    name: r.clone(),
                    section: s.name.clone(),
                    expected,
                    observed: o.index_in_section,
                });
            }
        }
    }

    diffs.sort();
    Ok(DriftReport { diffs })
}
