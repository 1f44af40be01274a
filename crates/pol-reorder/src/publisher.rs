use pol_catalog::PolicyCatalog;
use tracing::info;

use crate::{ReorderError, Step};

/// Commit the catalog's staged draft.
///
/// Idempotent on the catalog side, so a run that staged moves but failed to
/// publish can be finished by calling this alone.
pub fn publish<C: PolicyCatalog + ?Sized>(
    catalog: &mut C,
    completed: usize,
) -> Result<(), ReorderError> {
    catalog
        .publish_revision()
        .map_err(|e| ReorderError::catalog(Step::Publish, completed, e))?;
    info!(domain = %catalog.domain(), "published staged revision");
    Ok(())
}
