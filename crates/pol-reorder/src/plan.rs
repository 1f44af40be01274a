use std::fmt;

use pol_catalog::{PolicyDomain, RulePosition};

use crate::Anchor;

/// Where a section move points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionTarget {
    /// After an existing section.
    AfterSection { id: String, name: String },
    /// After the section created by the bootstrap step of the same plan.
    /// Its id is only known once that step has run.
    AfterDefault,
    LastInPolicy,
}

/// One catalog call of a reconciliation, with names kept for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedCall {
    AddDefaultSection {
        name: String,
    },
    MoveSection {
        name: String,
        id: String,
        after: SectionTarget,
    },
    MoveRule {
        name: String,
        id: String,
        /// Name of the referenced section (first rule) or previous rule.
        reference: String,
        to: RulePosition,
    },
    Publish,
}

impl PlannedCall {
    pub fn is_publish(&self) -> bool {
        matches!(self, PlannedCall::Publish)
    }
}

impl fmt::Display for PlannedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedCall::AddDefaultSection { name } => {
                write!(f, "addSection '{name}' LAST_IN_POLICY")
            }
            PlannedCall::MoveSection { name, id, after } => {
                write!(f, "moveSection '{name}' ({id}) ")?;
                match after {
                    SectionTarget::AfterSection { id, name } => {
                        write!(f, "AFTER_SECTION '{name}' ({id})")
                    }
                    SectionTarget::AfterDefault => f.write_str("AFTER_SECTION <default>"),
                    SectionTarget::LastInPolicy => f.write_str("LAST_IN_POLICY"),
                }
            }
            PlannedCall::MoveRule {
                name,
                id,
                reference,
                to,
            } => match to {
                RulePosition::FirstInSection(r) => write!(
                    f,
                    "moveRule '{name}' ({id}) FIRST_IN_SECTION '{reference}' ({r})"
                ),
                RulePosition::AfterRule(r) => {
                    write!(f, "moveRule '{name}' ({id}) AFTER_RULE '{reference}' ({r})")
                }
            },
            PlannedCall::Publish => f.write_str("publishRevision"),
        }
    }
}

/// The full, ordered call sequence of one reconciliation.
///
/// Built from a fresh catalog snapshot by [`crate::plan`]; every name in it is
/// already resolved, so executing it can only fail on the catalog side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderPlan {
    pub domain: PolicyDomain,
    pub anchor: Anchor,
    pub calls: Vec<PlannedCall>,
}

impl ReorderPlan {
    pub fn section_moves(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PlannedCall::MoveSection { .. }))
            .count()
    }

    pub fn rule_moves(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PlannedCall::MoveRule { .. }))
            .count()
    }

    pub fn publishes(&self) -> bool {
        self.calls.last().is_some_and(PlannedCall::is_publish)
    }
}

impl fmt::Display for ReorderPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "domain={} anchor={}", self.domain, self.anchor)?;
        for (i, call) in self.calls.iter().enumerate() {
            writeln!(f, "{:>4}. {call}", i + 1)?;
        }
        Ok(())
    }
}
