//! Anchor selection and default-section bootstrap.
//!
//! The managed chain is always linked after *something*. In order of
//! preference:
//! 1. the caller's explicit `start_anchor_id` (must exist, must not be managed),
//! 2. the catalog's first section in current order, which keeps whatever
//!    already precedes the managed region in place,
//! 3. the first unmanaged section, when the first section is itself managed,
//! 4. `LAST_IN_POLICY` for the chain head, when every section is managed,
//! 5. a freshly created default section, when the catalog has no sections.

use std::fmt;

use pol_catalog::{CatalogSection, PolicyCatalog, SectionPosition};
use tracing::{info, warn};

use crate::{NameIndex, ReorderError, ResolvedTopology, Step};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Caller-supplied `start_anchor_id`.
    Explicit { id: String, name: String },
    /// Picked from the catalog's current order.
    Existing { id: String, name: String },
    /// The catalog is empty; a section with this name is created first.
    Bootstrap { name: String },
    /// Every catalog section is managed; the chain head goes last in policy.
    LastInPolicy,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Explicit { id, name } => write!(f, "explicit '{name}' ({id})"),
            Anchor::Existing { id, name } => write!(f, "existing '{name}' ({id})"),
            Anchor::Bootstrap { name } => write!(f, "bootstrap '{name}'"),
            Anchor::LastInPolicy => f.write_str("LAST_IN_POLICY"),
        }
    }
}

/// Decide what the managed chain is linked after. Never touches the catalog.
pub fn choose_anchor(
    index: &NameIndex,
    resolved: &ResolvedTopology,
    explicit: Option<&str>,
    default_section_name: &str,
) -> Result<Anchor, ReorderError> {
    if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
        let section = index
            .section_by_id(id)
            .ok_or_else(|| ReorderError::AnchorNotFound { id: id.to_string() })?;
        if resolved.manages_section_id(id) {
            return Err(ReorderError::AnchorIsManaged {
                id: id.to_string(),
                name: section.name.clone(),
            });
        }
        return Ok(Anchor::Explicit {
            id: section.id.clone(),
            name: section.name.clone(),
        });
    }

    let Some(first) = index.sections().first() else {
        return Ok(Anchor::Bootstrap {
            name: default_section_name.to_string(),
        });
    };

    if !resolved.manages_section_id(&first.id) {
        return Ok(Anchor::Existing {
            id: first.id.clone(),
            name: first.name.clone(),
        });
    }

    match index
        .sections()
        .iter()
        .find(|s| !resolved.manages_section_id(&s.id))
    {
        Some(s) => {
            warn!(
                first = %first.name,
                anchor = %s.name,
                "first catalog section is managed; anchoring after first unmanaged section"
            );
            Ok(Anchor::Existing {
                id: s.id.clone(),
                name: s.name.clone(),
            })
        }
        None => {
            warn!("every catalog section is managed; chain head goes LAST_IN_POLICY");
            Ok(Anchor::LastInPolicy)
        }
    }
}

/// Create the default section at the end of the policy and return it.
///
/// `completed` is the number of mutating calls already issued in this run,
/// carried into the error for reporting.
pub fn bootstrap_default_section<C: PolicyCatalog + ?Sized>(
    catalog: &mut C,
    name: &str,
    completed: usize,
) -> Result<CatalogSection, ReorderError> {
    let created = catalog
        .add_section(name, SectionPosition::LastInPolicy)
        .map_err(|e| {
            ReorderError::catalog(
                Step::AddDefaultSection {
                    name: name.to_string(),
                },
                completed,
                e,
            )
        })?;
    info!(
        domain = %catalog.domain(),
        id = %created.id,
        name = %created.name,
        "created default section on empty policy"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{order_topology, DesiredTopology};

    fn index(sections: &[(&str, &str)]) -> NameIndex {
        let sections: Vec<CatalogSection> = sections
            .iter()
            .map(|(id, name)| CatalogSection::new(*id, *name))
            .collect();
        NameIndex::from_parts(&sections, &[])
    }

    fn resolved(index: &NameIndex, names: &[&str]) -> ResolvedTopology {
        let mut desired = DesiredTopology::new();
        for (i, n) in names.iter().enumerate() {
            desired = desired.section(*n, i as i64 + 1);
        }
        index.resolve(&order_topology(&desired).unwrap()).unwrap()
    }

    #[test]
    fn empty_catalog_bootstraps() {
        let idx = index(&[]);
        let anchor = choose_anchor(&idx, &resolved(&idx, &[]), None, "Default").unwrap();
        assert_eq!(
            anchor,
            Anchor::Bootstrap {
                name: "Default".to_string()
            }
        );
    }

    #[test]
    fn defaults_to_first_section_in_current_order() {
        let idx = index(&[("s-u", "Unmanaged"), ("s-a", "A")]);
        let anchor = choose_anchor(&idx, &resolved(&idx, &["A"]), None, "Default").unwrap();
        assert_eq!(
            anchor,
            Anchor::Existing {
                id: "s-u".to_string(),
                name: "Unmanaged".to_string()
            }
        );
    }

    #[test]
    fn managed_first_section_falls_back_to_first_unmanaged() {
        let idx = index(&[("s-a", "A"), ("s-u", "Unmanaged"), ("s-b", "B")]);
        let anchor = choose_anchor(&idx, &resolved(&idx, &["A", "B"]), None, "Default").unwrap();
        assert_eq!(
            anchor,
            Anchor::Existing {
                id: "s-u".to_string(),
                name: "Unmanaged".to_string()
            }
        );
    }

    #[test]
    fn all_managed_goes_last_in_policy() {
        let idx = index(&[("s-a", "A"), ("s-b", "B")]);
        let anchor = choose_anchor(&idx, &resolved(&idx, &["B", "A"]), None, "Default").unwrap();
        assert_eq!(anchor, Anchor::LastInPolicy);
    }

    #[test]
    fn explicit_anchor_must_exist_and_be_unmanaged() {
        let idx = index(&[("s-u", "Unmanaged"), ("s-a", "A")]);
        let res = resolved(&idx, &["A"]);

        assert_eq!(
            choose_anchor(&idx, &res, Some("s-x"), "Default").unwrap_err(),
            ReorderError::AnchorNotFound {
                id: "s-x".to_string()
            }
        );
        assert_eq!(
            choose_anchor(&idx, &res, Some("s-a"), "Default").unwrap_err(),
            ReorderError::AnchorIsManaged {
                id: "s-a".to_string(),
                name: "A".to_string()
            }
        );
        assert_eq!(
            choose_anchor(&idx, &res, Some("s-u"), "Default").unwrap(),
            Anchor::Explicit {
                id: "s-u".to_string(),
                name: "Unmanaged".to_string()
            }
        );
    }

    #[test]
    fn blank_explicit_anchor_counts_as_unset() {
        let idx = index(&[("s-u", "Unmanaged"), ("s-a", "A")]);
        let anchor = choose_anchor(&idx, &resolved(&idx, &["A"]), Some("  "), "Default").unwrap();
        assert!(matches!(anchor, Anchor::Existing { .. }));
    }
}
