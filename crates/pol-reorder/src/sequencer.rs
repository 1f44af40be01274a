//! Section and rule chain builders.
//!
//! Both use the same relinking strategy: keep a cursor, move each entity
//! directly after the cursor, advance the cursor to the entity just moved.
//! Every listed entity is moved on every run; this is not a minimal diff.
//! Sections and rules absent from the topology are never referenced.

use pol_catalog::RulePosition;

use crate::{Anchor, PlannedCall, ResolvedTopology, SectionTarget};

/// One `moveSection` per managed section, chained from `anchor`.
pub fn sequence_sections(resolved: &ResolvedTopology, anchor: &Anchor) -> Vec<PlannedCall> {
    let mut cursor = match anchor {
        Anchor::Explicit { id, name } | Anchor::Existing { id, name } => {
            SectionTarget::AfterSection {
                id: id.clone(),
                name: name.clone(),
            }
        }
        Anchor::Bootstrap { .. } => SectionTarget::AfterDefault,
        Anchor::LastInPolicy => SectionTarget::LastInPolicy,
    };

    let mut calls = Vec::with_capacity(resolved.sections.len());
    for s in &resolved.sections {
        calls.push(PlannedCall::MoveSection {
            name: s.name.clone(),
            id: s.id.clone(),
            after: cursor,
        });
        cursor = SectionTarget::AfterSection {
            id: s.id.clone(),
            name: s.name.clone(),
        };
    }
    calls
}

/// One `moveRule` per managed rule: the first rule of each section goes
/// `FIRST_IN_SECTION`, each following rule `AFTER_RULE` its predecessor.
/// Sections are visited in the same order the section chain was built.
pub fn sequence_rules(resolved: &ResolvedTopology) -> Vec<PlannedCall> {
    let mut calls = Vec::with_capacity(resolved.rule_count());
    for s in &resolved.sections {
        let mut prev: Option<(&str, &str)> = None;
        for r in &s.rules {
            let (reference, to) = match prev {
                None => (s.name.clone(), RulePosition::FirstInSection(s.id.clone())),
                Some((prev_name, prev_id)) => (
                    prev_name.to_string(),
                    RulePosition::AfterRule(prev_id.to_string()),
                ),
            };
            calls.push(PlannedCall::MoveRule {
                name: r.name.clone(),
                id: r.id.clone(),
                reference,
                to,
            });
            prev = Some((r.name.as_str(), r.id.as_str()));
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResolvedRule, ResolvedSection};

    fn resolved() -> ResolvedTopology {
        let rule = |name: &str| ResolvedRule {
            name: name.to_string(),
            id: format!("id-{name}"),
        };
        ResolvedTopology {
            sections: vec![
                ResolvedSection {
                    name: "A".to_string(),
                    id: "s-a".to_string(),
                    rules: vec![rule("r1"), rule("r2")],
                },
                ResolvedSection {
                    name: "B".to_string(),
                    id: "s-b".to_string(),
                    rules: vec![rule("r3")],
                },
                ResolvedSection {
                    name: "C".to_string(),
                    id: "s-c".to_string(),
                    rules: vec![],
                },
            ],
        }
    }

    #[test]
    fn sections_chain_from_anchor() {
        let anchor = Anchor::Existing {
            id: "s-0".to_string(),
            name: "Head".to_string(),
        };
        let calls = sequence_sections(&resolved(), &anchor);
        let rendered: Vec<String> = calls.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "moveSection 'A' (s-a) AFTER_SECTION 'Head' (s-0)",
                "moveSection 'B' (s-b) AFTER_SECTION 'A' (s-a)",
                "moveSection 'C' (s-c) AFTER_SECTION 'B' (s-b)",
            ]
        );
    }

    #[test]
    fn chain_head_follows_bootstrap_or_goes_last() {
        let calls = sequence_sections(
            &resolved(),
            &Anchor::Bootstrap {
                name: "Default".to_string(),
            },
        );
        assert!(matches!(
            &calls[0],
            PlannedCall::MoveSection {
                after: SectionTarget::AfterDefault,
                ..
            }
        ));

        let calls = sequence_sections(&resolved(), &Anchor::LastInPolicy);
        assert!(matches!(
            &calls[0],
            PlannedCall::MoveSection {
                after: SectionTarget::LastInPolicy,
                ..
            }
        ));
        assert!(matches!(
            &calls[1],
            PlannedCall::MoveSection {
                after: SectionTarget::AfterSection { .. },
                ..
            }
        ));
    }

    #[test]
    fn rules_restart_at_each_section() {
        let calls = sequence_rules(&resolved());
        let rendered: Vec<String> = calls.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "moveRule 'r1' (id-r1) FIRST_IN_SECTION 'A' (s-a)",
                "moveRule 'r2' (id-r2) AFTER_RULE 'r1' (id-r1)",
                "moveRule 'r3' (id-r3) FIRST_IN_SECTION 'B' (s-b)",
            ]
        );
    }

    #[test]
    fn empty_topology_emits_nothing() {
        let empty = ResolvedTopology::default();
        assert!(sequence_sections(&empty, &Anchor::LastInPolicy).is_empty());
        assert!(sequence_rules(&empty).is_empty());
    }
}
