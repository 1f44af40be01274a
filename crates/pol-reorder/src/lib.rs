//! pol-reorder
//!
//! Bulk policy reordering engine.
//!
//! Converges a [`PolicyCatalog`] whose API only offers *relative* positioning
//! to a caller-declared total order over sections and, within each section,
//! rules. One engine serves every policy domain; the domain is whatever the
//! catalog says it is.
//!
//! Write path:
//!
//! ```text
//! validate + order topology
//!   -> NameIndex (name -> id, fresh catalog snapshot)
//!   -> anchor choice / default-section bootstrap
//!   -> section chain  (moveSection AFTER previous)
//!   -> rule chains    (moveRule FIRST_IN_SECTION, then AFTER previous)
//!   -> publish
//! ```
//!
//! Read path: list rules in catalog order and recompute each rule's 1-based
//! position inside its section ([`recompute_indices`]).
//!
//! Every name is resolved and every anchor checked before the first mutating
//! call. After that, the first failing call aborts the run; nothing is retried
//! and nothing is rolled back. Re-running converges because every move is
//! re-issued unconditionally.

mod bootstrap;
mod drift;
mod engine;
mod error;
mod plan;
mod publisher;
mod recompute;
mod resolver;
mod sequencer;
mod topology;
mod types;

pub use bootstrap::{bootstrap_default_section, choose_anchor, Anchor};
pub use drift::{detect_drift, DriftReport, TopologyDiff};
pub use engine::{execute, plan, reconcile, ReconcileOutcome};
pub use error::{ReorderError, ResolutionReport, Step, TopologyIssue};
pub use plan::{PlannedCall, ReorderPlan, SectionTarget};
pub use publisher::publish;
pub use recompute::{observe, read_back, recompute_indices};
pub use resolver::{Lookup, NameIndex, ResolvedRule, ResolvedSection, ResolvedTopology};
pub use sequencer::{sequence_rules, sequence_sections};
pub use topology::{order_topology, OrderedSection, OrderedTopology};
pub use types::*;

pub use pol_catalog::{PolicyCatalog, PolicyDomain};
