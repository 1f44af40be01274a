use std::fmt;

use pol_catalog::CatalogError;

/// A defect in the caller's desired topology, detected before any catalog call.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TopologyIssue {
    /// Section entry at `position` (0-based, input order) has an empty name.
    EmptySectionName { position: usize },
    /// Rule entry at `position` (0-based, input order) has an empty name.
    EmptyRuleName { position: usize },
    DuplicateSection { name: String },
    /// Same rule name twice within one section.
    DuplicateRule { name: String, section: String },
    /// A rule names a section the topology does not declare.
    UndeclaredSection { rule: String, section: String },
}

impl fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySectionName { position } => {
                write!(f, "section #{position} has an empty name")
            }
            Self::EmptyRuleName { position } => write!(f, "rule #{position} has an empty name"),
            Self::DuplicateSection { name } => write!(f, "section '{name}' declared twice"),
            Self::DuplicateRule { name, section } => {
                write!(f, "rule '{name}' declared twice in section '{section}'")
            }
            Self::UndeclaredSection { rule, section } => {
                write!(f, "rule '{rule}' targets undeclared section '{section}'")
            }
        }
    }
}

/// Every desired name that could not be mapped to exactly one catalog id.
///
/// Lists are sorted and de-duplicated so the message is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub missing_sections: Vec<String>,
    pub missing_rules: Vec<String>,
    /// Names matching more than one catalog section.
    pub ambiguous_sections: Vec<String>,
    /// Names matching more than one catalog rule.
    pub ambiguous_rules: Vec<String>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.missing_sections.is_empty()
            && self.missing_rules.is_empty()
            && self.ambiguous_sections.is_empty()
            && self.ambiguous_rules.is_empty()
    }

    pub(crate) fn finish(mut self) -> Self {
        for v in [
            &mut self.missing_sections,
            &mut self.missing_rules,
            &mut self.ambiguous_sections,
            &mut self.ambiguous_rules,
        ] {
            v.sort();
            v.dedup();
        }
        self
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.missing_sections.is_empty() {
            parts.push(format!("unknown sections {:?}", self.missing_sections));
        }
        if !self.missing_rules.is_empty() {
            parts.push(format!("unknown rules {:?}", self.missing_rules));
        }
        if !self.ambiguous_sections.is_empty() {
            parts.push(format!("ambiguous sections {:?}", self.ambiguous_sections));
        }
        if !self.ambiguous_rules.is_empty() {
            parts.push(format!("ambiguous rules {:?}", self.ambiguous_rules));
        }
        f.write_str(&parts.join("; "))
    }
}

/// The catalog call that was in flight when a run aborted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    ListSections,
    ListRules,
    AddDefaultSection { name: String },
    MoveSection { name: String, id: String },
    MoveRule { name: String, id: String },
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ListSections => f.write_str("listSections"),
            Step::ListRules => f.write_str("listRules"),
            Step::AddDefaultSection { name } => write!(f, "addSection '{name}'"),
            Step::MoveSection { name, id } => write!(f, "moveSection '{name}' ({id})"),
            Step::MoveRule { name, id } => write!(f, "moveRule '{name}' ({id})"),
            Step::Publish => f.write_str("publishRevision"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReorderError {
    /// The desired topology is malformed. Nothing was sent to the catalog.
    InvalidTopology { issues: Vec<TopologyIssue> },
    /// Desired names missing from (or ambiguous in) the catalog. Nothing was mutated.
    UnresolvedNames(ResolutionReport),
    /// Explicit `start_anchor_id` is not a catalog section. Nothing was mutated.
    AnchorNotFound { id: String },
    /// Explicit `start_anchor_id` is one of the sections being reordered.
    AnchorIsManaged { id: String, name: String },
    /// A catalog call failed. `completed` mutating calls had already succeeded
    /// and remain applied to the draft.
    Catalog {
        step: Step,
        completed: usize,
        source: CatalogError,
    },
}

impl ReorderError {
    pub(crate) fn catalog(step: Step, completed: usize, source: CatalogError) -> Self {
        ReorderError::Catalog {
            step,
            completed,
            source,
        }
    }
}

impl fmt::Display for ReorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReorderError::InvalidTopology { issues } => {
                let list: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
                write!(f, "invalid topology: {}", list.join("; "))
            }
            ReorderError::UnresolvedNames(report) => {
                write!(f, "unresolved names, no move issued: {report}")
            }
            ReorderError::AnchorNotFound { id } => {
                write!(f, "start anchor section '{id}' not found in catalog")
            }
            ReorderError::AnchorIsManaged { id, name } => write!(
                f,
                "start anchor section '{id}' ('{name}') is itself in the managed order"
            ),
            ReorderError::Catalog {
                step,
                completed,
                source,
            } => write!(
                f,
                "{step} failed after {completed} completed call(s): {source}"
            ),
        }
    }
}

impl std::error::Error for ReorderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReorderError::Catalog { source, .. } => Some(source),
            _ => None,
        }
    }
}
