//! Plan / execute entry points.
//!
//! [`plan`] only reads the catalog. [`execute`] issues the planned calls
//! strictly in order and stops at the first failure. [`reconcile`] is the
//! two back to back, which is what a resource create/update does.

use pol_catalog::{CatalogSection, PolicyCatalog, PolicyDomain, SectionPosition};
use tracing::{debug, info};

use crate::{
    bootstrap_default_section, choose_anchor, order_topology, publish, sequence_rules,
    sequence_sections, Anchor, DesiredTopology, NameIndex, PlannedCall, ReorderError,
    ReorderOptions, ReorderPlan, SectionTarget, Step,
};

/// Result of a successful [`execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub plan: ReorderPlan,
    /// Section created on an empty policy, if any.
    pub bootstrapped_section: Option<CatalogSection>,
    /// Mutating calls issued (bootstrap, moves and publish).
    pub calls_issued: usize,
    pub published: bool,
}

/// Build the call sequence for `desired` against the catalog as it is now.
///
/// Validation, name resolution and anchor checks all happen here, so any
/// error returned from this function means the catalog was not mutated.
pub fn plan<C: PolicyCatalog + ?Sized>(
    catalog: &C,
    desired: &DesiredTopology,
    options: &ReorderOptions,
) -> Result<ReorderPlan, ReorderError> {
    let domain = catalog.domain();
    let ordered = order_topology(desired)?;
    let index = NameIndex::from_catalog(catalog)?;
    let resolved = index.resolve(&ordered)?;

    let default_name = default_section_name(domain, options);
    let anchor = choose_anchor(
        &index,
        &resolved,
        desired.start_anchor_id.as_deref(),
        default_name,
    )?;

    let mut calls = Vec::with_capacity(resolved.sections.len() + resolved.rule_count() + 2);
    if let Anchor::Bootstrap { name } = &anchor {
        calls.push(PlannedCall::AddDefaultSection { name: name.clone() });
    }
    calls.extend(sequence_sections(&resolved, &anchor));
    calls.extend(sequence_rules(&resolved));
    if options.publish {
        calls.push(PlannedCall::Publish);
    }

    debug!(
        domain = %domain,
        anchor = %anchor,
        sections = resolved.sections.len(),
        rules = resolved.rule_count(),
        calls = calls.len(),
        "reorder plan built"
    );

    Ok(ReorderPlan {
        domain,
        anchor,
        calls,
    })
}

fn default_section_name(domain: PolicyDomain, options: &ReorderOptions) -> &str {
    match options.default_section_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => domain.default_section_name(),
    }
}

/// Issue every call of `plan`, in order.
///
/// No retry and no rollback: on failure the error names the failing step
/// and how many calls had completed; those stay applied to the draft.
pub fn execute<C: PolicyCatalog + ?Sized>(
    catalog: &mut C,
    plan: &ReorderPlan,
) -> Result<ReconcileOutcome, ReorderError> {
    let mut completed = 0usize;
    let mut bootstrapped: Option<CatalogSection> = None;
    let mut published = false;

    for call in &plan.calls {
        match call {
            PlannedCall::AddDefaultSection { name } => {
                bootstrapped = Some(bootstrap_default_section(catalog, name, completed)?);
            }
            PlannedCall::MoveSection { name, id, after } => {
                let to = match after {
                    SectionTarget::AfterSection { id, .. } => {
                        SectionPosition::AfterSection(id.clone())
                    }
                    SectionTarget::AfterDefault => match &bootstrapped {
                        Some(s) => SectionPosition::AfterSection(s.id.clone()),
                        // The default section was added last, so the two are equivalent.
                        None => SectionPosition::LastInPolicy,
                    },
                    SectionTarget::LastInPolicy => SectionPosition::LastInPolicy,
                };
                debug!(section = %name, id = %id, to = %to, "moveSection");
                catalog.move_section(id, to).map_err(|e| {
                    ReorderError::catalog(
                        Step::MoveSection {
                            name: name.clone(),
                            id: id.clone(),
                        },
                        completed,
                        e,
                    )
                })?;
            }
            PlannedCall::MoveRule { name, id, to, .. } => {
                debug!(rule = %name, id = %id, to = %to, "moveRule");
                catalog.move_rule(id, to.clone()).map_err(|e| {
                    ReorderError::catalog(
                        Step::MoveRule {
                            name: name.clone(),
                            id: id.clone(),
                        },
                        completed,
                        e,
                    )
                })?;
            }
            PlannedCall::Publish => {
                publish(catalog, completed)?;
                published = true;
            }
        }
        completed += 1;
    }

    info!(
        domain = %plan.domain,
        sections = plan.section_moves(),
        rules = plan.rule_moves(),
        calls = completed,
        published,
        "reorder applied"
    );

    Ok(ReconcileOutcome {
        plan: plan.clone(),
        bootstrapped_section: bootstrapped,
        calls_issued: completed,
        published,
    })
}

/// Plan against a fresh snapshot and execute immediately.
pub fn reconcile<C: PolicyCatalog + ?Sized>(
    catalog: &mut C,
    desired: &DesiredTopology,
    options: &ReorderOptions,
) -> Result<ReconcileOutcome, ReorderError> {
    let plan = plan(&*catalog, desired, options)?;
    execute(catalog, &plan)
}
