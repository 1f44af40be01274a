//! Snapshot Adapter: catalog wire format to/from [`InMemoryCatalog`].
//!
//! # Purpose
//! A catalog can be captured as a JSON document (e.g. exported from the
//! remote policy API, or written back by `polctl apply`). This module defines
//! the *raw* structs mirroring that document and two conversions:
//! [`normalize`] (raw → catalog, validating as it goes) and [`snapshot`]
//! (catalog → raw).
//!
//! # Design constraints
//! - Pure, deterministic conversion. No IO.
//! - All validation failures are surfaced as [`SnapshotAdapterError`].
//! - Unknown JSON fields are ignored (`deny_unknown_fields` is NOT set) so
//!   exports carrying extra rule attributes still load.
//! - `rules` is the catalog's global order. Rules are attached to their
//!   section in list order, so in-section order is preserved even when the
//!   export interleaves sections.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, CatalogRule, CatalogSection, InMemoryCatalog, PolicyDomain};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotAdapterError {
    /// `domain` is not one of the known policy domains.
    UnknownDomain { raw: String },
    /// A section entry has an empty `id`.
    MissingSectionId { name: String },
    /// A section entry has an empty `name`.
    MissingSectionName { id: String },
    /// Two section entries share an `id`.
    DuplicateSectionId { id: String },
    /// A rule entry has an empty `id`.
    MissingRuleId { name: String },
    /// A rule entry has an empty `name`.
    MissingRuleName { id: String },
    /// Two rule entries share an `id`.
    DuplicateRuleId { id: String },
    /// A rule references a `section_id` not present in `sections`.
    UnknownSection { rule_id: String, section_id: String },
    /// A rule's `section_name` disagrees with the referenced section.
    SectionNameMismatch {
        rule_id: String,
        expected: String,
        got: String,
    },
    /// The staged draft does not hold exactly the published rule set.
    DraftRuleSetMismatch { rule_id: String },
}

impl std::fmt::Display for SnapshotAdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDomain { raw } => write!(f, "unknown policy domain '{raw}'"),
            Self::MissingSectionId { name } => write!(f, "section '{name}' has empty id"),
            Self::MissingSectionName { id } => write!(f, "section '{id}' has empty name"),
            Self::DuplicateSectionId { id } => write!(f, "duplicate section id '{id}'"),
            Self::MissingRuleId { name } => write!(f, "rule '{name}' has empty id"),
            Self::MissingRuleName { id } => write!(f, "rule '{id}' has empty name"),
            Self::DuplicateRuleId { id } => write!(f, "duplicate rule id '{id}'"),
            Self::UnknownSection {
                rule_id,
                section_id,
            } => write!(f, "rule '{rule_id}' references unknown section '{section_id}'"),
            Self::SectionNameMismatch {
                rule_id,
                expected,
                got,
            } => write!(
                f,
                "rule '{rule_id}' has section_name '{got}' but its section is named '{expected}'"
            ),
            Self::DraftRuleSetMismatch { rule_id } => write!(
                f,
                "staged draft and published policy disagree on rule '{rule_id}'"
            ),
        }
    }
}

impl std::error::Error for SnapshotAdapterError {}

// ---------------------------------------------------------------------------
// Raw wire-level structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSection {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    pub id: String,
    pub name: String,
    pub section_id: String,
    /// Optional on input; always written on output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Section/rule layout of one view (published or staged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLayout {
    pub sections: Vec<RawSection>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

/// Top-level catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogSnapshot {
    pub domain: String,
    #[serde(default)]
    pub revision: u64,
    /// Published policy.
    #[serde(flatten)]
    pub published: RawLayout,
    /// Staged changes not yet published. Absent when draft == published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<RawLayout>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Validated layout: sections in chain order, each with its rule ids in order.
struct Layout {
    sections: Vec<(CatalogSection, Vec<String>)>,
    /// rule id -> (name, description, enabled), in global order.
    rules: Vec<(String, String, String, bool)>,
}

fn validate_layout(raw: RawLayout) -> Result<Layout, SnapshotAdapterError> {
    let mut section_ids: BTreeSet<String> = BTreeSet::new();
    let mut sections: Vec<(CatalogSection, Vec<String>)> = Vec::with_capacity(raw.sections.len());

    for s in raw.sections {
        let id = s.id.trim().to_string();
        let name = s.name.trim().to_string();
        if id.is_empty() {
            return Err(SnapshotAdapterError::MissingSectionId { name });
        }
        if name.is_empty() {
            return Err(SnapshotAdapterError::MissingSectionName { id });
        }
        if !section_ids.insert(id.clone()) {
            return Err(SnapshotAdapterError::DuplicateSectionId { id });
        }
        sections.push((CatalogSection::new(id, name), Vec::new()));
    }

    let mut rule_ids: BTreeSet<String> = BTreeSet::new();
    let mut rules = Vec::with_capacity(raw.rules.len());
    for r in raw.rules {
        let id = r.id.trim().to_string();
        let name = r.name.trim().to_string();
        if id.is_empty() {
            return Err(SnapshotAdapterError::MissingRuleId { name });
        }
        if name.is_empty() {
            return Err(SnapshotAdapterError::MissingRuleName { id });
        }
        if !rule_ids.insert(id.clone()) {
            return Err(SnapshotAdapterError::DuplicateRuleId { id });
        }

        let section_id = r.section_id.trim();
        let slot = sections
            .iter_mut()
            .find(|(s, _)| s.id == section_id)
            .ok_or_else(|| SnapshotAdapterError::UnknownSection {
                rule_id: id.clone(),
                section_id: section_id.to_string(),
            })?;
        if let Some(got) = r.section_name.as_deref().map(str::trim) {
            if got != slot.0.name {
                return Err(SnapshotAdapterError::SectionNameMismatch {
                    rule_id: id,
                    expected: slot.0.name.clone(),
                    got: got.to_string(),
                });
            }
        }
        slot.1.push(id.clone());
        rules.push((id, name, r.description, r.enabled));
    }

    Ok(Layout { sections, rules })
}

/// Convert a raw catalog document into a ready-to-use [`InMemoryCatalog`].
pub fn normalize(raw: RawCatalogSnapshot) -> Result<InMemoryCatalog, SnapshotAdapterError> {
    let domain = PolicyDomain::parse(&raw.domain).ok_or_else(|| {
        SnapshotAdapterError::UnknownDomain {
            raw: raw.domain.clone(),
        }
    })?;

    let published = validate_layout(raw.published)?;
    let mut catalog = InMemoryCatalog::new(domain);

    // Seeding cannot fail: ids were validated unique and references resolved.
    for (section, _) in &published.sections {
        catalog
            .seed_section(section.id.clone(), section.name.clone())
            .map_err(|_| SnapshotAdapterError::DuplicateSectionId {
                id: section.id.clone(),
            })?;
    }
    for (section, rule_ids) in &published.sections {
        for rid in rule_ids {
            if let Some((_, name, description, enabled)) =
                published.rules.iter().find(|(id, ..)| id == rid)
            {
                catalog
                    .seed_rule(&section.id, rid.clone(), name.clone(), description.clone(), *enabled)
                    .map_err(|_| SnapshotAdapterError::DuplicateRuleId { id: rid.clone() })?;
            }
        }
    }

    if let Some(draft) = raw.draft {
        let staged = validate_layout(draft)?;
        let published_ids: BTreeSet<&str> =
            published.rules.iter().map(|(id, ..)| id.as_str()).collect();
        let staged_ids: BTreeSet<&str> = staged.rules.iter().map(|(id, ..)| id.as_str()).collect();
        if let Some(id) = published_ids.symmetric_difference(&staged_ids).next() {
            return Err(SnapshotAdapterError::DraftRuleSetMismatch {
                rule_id: id.to_string(),
            });
        }
        catalog
            .stage_layout(staged.sections)
            .map_err(|e| match e {
                CatalogError::NotFound { id, .. } => {
                    SnapshotAdapterError::DraftRuleSetMismatch { rule_id: id }
                }
                other => SnapshotAdapterError::DraftRuleSetMismatch {
                    rule_id: other.to_string(),
                },
            })?;
    }

    catalog.set_revision(raw.revision);
    Ok(catalog)
}

fn layout_of(sections: Vec<CatalogSection>, rules: Vec<CatalogRule>) -> RawLayout {
    RawLayout {
        sections: sections
            .into_iter()
            .map(|s| RawSection {
                id: s.id,
                name: s.name,
            })
            .collect(),
        rules: rules
            .into_iter()
            .map(|r| RawRule {
                id: r.id,
                name: r.name,
                section_id: r.section_id,
                section_name: Some(r.section_name),
                description: r.description,
                enabled: r.enabled,
            })
            .collect(),
    }
}

/// Capture a catalog as a raw document. `draft` is written only when there
/// are unpublished changes.
pub fn snapshot(catalog: &InMemoryCatalog) -> RawCatalogSnapshot {
    use crate::PolicyCatalog;

    let draft = if catalog.has_unpublished_changes() {
        Some(layout_of(catalog.staged_sections(), catalog.staged_rules()))
    } else {
        None
    };
    RawCatalogSnapshot {
        domain: catalog.domain().as_str().to_string(),
        revision: catalog.revision(),
        published: layout_of(catalog.published_sections(), catalog.published_rules()),
        draft,
    }
}
