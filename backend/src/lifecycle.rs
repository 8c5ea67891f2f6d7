//! Branch lifecycle: a branch is opened once and may be closed once.
//! There is no transition back to active and closing never deletes data.

use time::Date;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::branch::Branch,
    store::FleetStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Active,
    Closed { on: Date },
}

impl BranchState {
    pub fn of(branch: &Branch) -> Self {
        match branch.closure_date {
            None => BranchState::Active,
            Some(on) => BranchState::Closed { on },
        }
    }

    /// Decides what closing on `today` does from this state.
    pub fn close(self, today: Date) -> Closure {
        match self {
            BranchState::Active => Closure::Close(today),
            BranchState::Closed { on } => Closure::AlreadyClosed(on),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Close(Date),
    /// Repeated close: keeps the original date and still succeeds.
    AlreadyClosed(Date),
}

/// Closes the branch `id` as of `today`, returning the effective closure date.
pub async fn close_branch(store: &dyn FleetStore, id: Uuid, today: Date) -> Result<Date> {
    let branch = store
        .find_branch(id)
        .await?
        .ok_or_else(|| AppError::not_found("Branch", id))?;

    match BranchState::of(&branch).close(today) {
        Closure::Close(on) => {
            if store.mark_branch_closed(id, on).await? {
                tracing::info!(branch_id = %id, closed_on = %on, "branch closed");
                return Ok(on);
            }
            // Lost a race with another close; report the date that won.
            let current = store
                .find_branch(id)
                .await?
                .and_then(|b| b.closure_date)
                .unwrap_or(on);
            Ok(current)
        }
        Closure::AlreadyClosed(on) => {
            tracing::debug!(branch_id = %id, closed_on = %on, "branch already closed");
            Ok(on)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::branch::Address;
    use crate::store::MemoryStore;
    use time::macros::date;

    fn active_branch() -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name: "Filial Sul".into(),
            tax_id: "98765432000199".into(),
            phone: Some("(11) 5555-0000".into()),
            opening_date: date!(2021 - 03 - 01),
            closure_date: None,
            address: Address {
                postal_code: "04001000".into(),
                street: "Av. Paulista".into(),
                number: "900".into(),
                complement: Some("Sala 3".into()),
                district: "Bela Vista".into(),
                city: "Sao Paulo".into(),
                region_code: "SP".into(),
                country: "Brasil".into(),
            },
        }
    }

    #[test]
    fn active_branch_closes_today() {
        let state = BranchState::of(&active_branch());
        assert_eq!(state, BranchState::Active);
        assert_eq!(
            state.close(date!(2025 - 05 - 20)),
            Closure::Close(date!(2025 - 05 - 20))
        );
    }

    #[test]
    fn closed_branch_keeps_its_date() {
        let state = BranchState::Closed {
            on: date!(2024 - 12 - 31),
        };
        let closure = state.close(date!(2025 - 05 - 20));
        assert_eq!(closure, Closure::AlreadyClosed(date!(2024 - 12 - 31)));
    }

    #[tokio::test]
    async fn close_branch_is_repeatable() {
        let store = MemoryStore::new();
        let branch = active_branch();
        store.insert_branch(&branch).await.unwrap();

        let first = close_branch(&store, branch.id, date!(2025 - 01 - 02)).await.unwrap();
        let second = close_branch(&store, branch.id, date!(2025 - 02 - 03)).await.unwrap();

        assert_eq!(first, date!(2025 - 01 - 02));
        assert_eq!(second, first);
        let stored = store.find_branch(branch.id).await.unwrap().unwrap();
        assert_eq!(stored.closure_date, Some(first));
    }

    #[tokio::test]
    async fn closing_an_unknown_branch_is_not_found() {
        let store = MemoryStore::new();
        let err = close_branch(&store, Uuid::new_v4(), date!(2025 - 01 - 02))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "Branch", .. }));
    }
}
