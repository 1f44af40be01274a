use serde::{Deserialize, Serialize};

/// Caller-declared order, supplied on every reconciliation.
///
/// Entities are addressed by name. `section_index` / `index_in_section` only
/// need to be ordered, not dense: `10, 20, 30` is as good as `1, 2, 3`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredTopology {
    /// Section id the managed chain starts after. When absent the engine
    /// picks an anchor (see [`crate::choose_anchor`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_anchor_id: Option<String>,
    #[serde(default)]
    pub sections: Vec<DesiredSection>,
    #[serde(default)]
    pub rules: Vec<DesiredRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredSection {
    pub name: String,
    pub section_index: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRule {
    pub name: String,
    pub section_name: String,
    pub index_in_section: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl DesiredTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, id: impl Into<String>) -> Self {
        self.start_anchor_id = Some(id.into());
        self
    }

    pub fn section(mut self, name: impl Into<String>, section_index: i64) -> Self {
        self.sections.push(DesiredSection {
            name: name.into(),
            section_index,
        });
        self
    }

    pub fn rule(
        mut self,
        name: impl Into<String>,
        section_name: impl Into<String>,
        index_in_section: i64,
    ) -> Self {
        self.rules.push(DesiredRule {
            name: name.into(),
            section_name: section_name.into(),
            index_in_section,
            description: String::new(),
            enabled: true,
        });
        self
    }
}

/// Tuning knobs for one reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderOptions {
    /// Name used when bootstrapping an empty policy. `None` = the domain default.
    pub default_section_name: Option<String>,
    /// Commit staged moves at the end. When `false` the moves stay in the draft.
    pub publish: bool,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            default_section_name: None,
            publish: true,
        }
    }
}

/// Persisted state for a section, as recomputed on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedSection {
    pub id: String,
    pub name: String,
    pub section_index: i64,
}

/// Persisted state for a rule, as recomputed on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRule {
    pub id: String,
    pub name: String,
    pub section_name: String,
    pub index_in_section: i64,
    pub description: String,
    pub enabled: bool,
}

/// Read-back of a catalog, shaped like the state a resource persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTopology {
    pub sections: Vec<ObservedSection>,
    pub rules: Vec<ObservedRule>,
}

impl ObservedTopology {
    pub fn section(&self, name: &str) -> Option<&ObservedSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// First rule called `name`, in any section.
    pub fn rule(&self, name: &str) -> Option<&ObservedRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rule_in(&self, section: &str, name: &str) -> Option<&ObservedRule> {
        self.rules
            .iter()
            .find(|r| r.section_name == section && r.name == name)
    }
}
