//! Relationship checks run before employee and vehicle writes.
//!
//! A write naming a branch that does not exist fails with
//! `AppError::InvalidReference` and never reaches the store. Closed branches
//! are still valid targets.

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::branch::Branch,
    store::FleetStore,
};

pub async fn validate_branch_reference(store: &dyn FleetStore, branch_id: Uuid) -> Result<Branch> {
    match store.find_branch(branch_id).await? {
        Some(branch) => Ok(branch),
        None => {
            tracing::info!(%branch_id, "rejected write referencing unknown branch");
            Err(AppError::InvalidReference(branch_id))
        }
    }
}

/// Checks the owner named by an update. The lookup is skipped when the owner
/// is unchanged.
pub async fn revalidate_branch_reference(
    store: &dyn FleetStore,
    current_branch_id: Uuid,
    requested_branch_id: Uuid,
) -> Result<()> {
    if current_branch_id != requested_branch_id {
        validate_branch_reference(store, requested_branch_id).await?;
    }
    Ok(())
}
