//! pol-catalog
//!
//! Capability boundary for a remote network-security policy store.
//!
//! The store holds ordered *sections* and, inside each section, ordered
//! *rules*. Every entity carries a server-assigned id and a user-assigned
//! name. Positioning is only ever relative: "after section X", "first in
//! section X", "after rule Y", "last in policy". Moves land in a staged draft
//! that becomes live on `publish_revision`.
//!
//! This crate defines:
//! - the [`PolicyCatalog`] trait consumed by the reorder engine,
//! - the catalog data types and [`CatalogError`],
//! - [`InMemoryCatalog`], a deterministic implementation (no network I/O),
//! - the snapshot wire adapter used to load/store a catalog as JSON.

mod memory;
pub mod snapshot_adapter;
mod types;

pub use memory::{CallKind, CatalogCall, InMemoryCatalog};
pub use types::*;

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Which kind of entity a catalog error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityKind {
    Section,
    Rule,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Section => "section",
            EntityKind::Rule => "rule",
        }
    }
}

/// Errors that a [`PolicyCatalog`] implementation may return.
///
/// The engine never retries; every variant is surfaced to the caller as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Network or transport failure.
    Transport(String),
    /// The remote API returned an application-level error.
    Api { code: Option<i64>, message: String },
    /// A referenced id does not exist in the catalog.
    NotFound { kind: EntityKind, id: String },
    /// The catalog refused the operation (e.g. a self-referencing move).
    Rejected(String),
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Transport(msg) => write!(f, "transport error: {msg}"),
            CatalogError::Api {
                code: Some(c),
                message,
            } => write!(f, "catalog api error code={c}: {message}"),
            CatalogError::Api {
                code: None,
                message,
            } => write!(f, "catalog api error: {message}"),
            CatalogError::NotFound { kind, id } => {
                write!(f, "{} '{id}' not found in catalog", kind.as_str())
            }
            CatalogError::Rejected(msg) => write!(f, "catalog rejected operation: {msg}"),
            CatalogError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Remote policy store contract, one instance per policy domain.
///
/// Every method is a blocking call. Implementations must be object-safe so
/// callers can hold a `Box<dyn PolicyCatalog>` without knowing the concrete
/// store.
///
/// `list_rules` returns rules in the catalog's single global order: sections
/// in chain order, rules in their in-section order.
pub trait PolicyCatalog {
    /// Policy domain served by this catalog.
    fn domain(&self) -> PolicyDomain;

    /// Current sections, in chain order.
    fn list_sections(&self) -> Result<Vec<CatalogSection>, CatalogError>;

    /// Current rules, globally ordered.
    fn list_rules(&self) -> Result<Vec<CatalogRule>, CatalogError>;

    /// Create a section and return it with its server-assigned id.
    fn add_section(
        &mut self,
        name: &str,
        at: SectionPosition,
    ) -> Result<CatalogSection, CatalogError>;

    /// Reposition an existing section.
    fn move_section(&mut self, id: &str, to: SectionPosition) -> Result<(), CatalogError>;

    /// Reposition an existing rule.
    fn move_rule(&mut self, id: &str, to: RulePosition) -> Result<(), CatalogError>;

    /// Commit all staged changes so they become the live policy.
    fn publish_revision(&mut self) -> Result<(), CatalogError>;
}

impl<C: PolicyCatalog + ?Sized> PolicyCatalog for Box<C> {
    fn domain(&self) -> PolicyDomain {
        (**self).domain()
    }

    fn list_sections(&self) -> Result<Vec<CatalogSection>, CatalogError> {
        (**self).list_sections()
    }

    fn list_rules(&self) -> Result<Vec<CatalogRule>, CatalogError> {
        (**self).list_rules()
    }

    fn add_section(
        &mut self,
        name: &str,
        at: SectionPosition,
    ) -> Result<CatalogSection, CatalogError> {
        (**self).add_section(name, at)
    }

    fn move_section(&mut self, id: &str, to: SectionPosition) -> Result<(), CatalogError> {
        (**self).move_section(id, to)
    }

    fn move_rule(&mut self, id: &str, to: RulePosition) -> Result<(), CatalogError> {
        (**self).move_rule(id, to)
    }

    fn publish_revision(&mut self) -> Result<(), CatalogError> {
        (**self).publish_revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display_api_with_code() {
        let err = CatalogError::Api {
            code: Some(409),
            message: "revision locked".to_string(),
        };
        assert_eq!(err.to_string(), "catalog api error code=409: revision locked");
    }

    #[test]
    fn catalog_error_display_not_found() {
        let err = CatalogError::NotFound {
            kind: EntityKind::Rule,
            id: "r-9".to_string(),
        };
        assert_eq!(err.to_string(), "rule 'r-9' not found in catalog");
    }

    #[test]
    fn catalog_is_object_safe_via_box() {
        let mut boxed: Box<dyn PolicyCatalog> =
            Box::new(InMemoryCatalog::new(PolicyDomain::WanNetwork));
        assert_eq!(boxed.domain(), PolicyDomain::WanNetwork);
        let created = boxed
            .add_section("Default", SectionPosition::LastInPolicy)
            .unwrap();
        assert_eq!(boxed.list_sections().unwrap(), vec![created]);
    }
}
