use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    extract::{Path, Query, ValidatedJson},
    links::{branch_href, HasLinks, Linked},
};
use crate::{
    error::{AppError, Result},
    idempotency::{IdempotencyKey, StoredResponse},
    lifecycle,
    models::{
        branch::{Branch, BranchRequest},
        common::PageParams,
    },
    pagination::{paginate, Page, Window},
    store::{BranchListing, FleetStore},
    AppState,
};

const CREATE_SCOPE: &str = "POST /api/v2/branches";

async fn register(store: &dyn FleetStore, req: BranchRequest) -> Result<Branch> {
    let branch = Branch::register(req);
    store.insert_branch(&branch).await?;
    tracing::info!(branch_id = %branch.id, tax_id = %branch.tax_id, "branch registered");
    Ok(branch)
}

async fn find(store: &dyn FleetStore, id: Uuid) -> Result<Branch> {
    store
        .find_branch(id)
        .await?
        .ok_or_else(|| AppError::not_found("Branch", id))
}

async fn find_by_tax_id(store: &dyn FleetStore, tax_id: &str) -> Result<Branch> {
    store
        .find_branch_by_tax_id(tax_id)
        .await?
        .ok_or_else(|| AppError::not_found("Branch", tax_id))
}

// v1: plain resources, full listings

pub async fn list(State(store): State<Arc<dyn FleetStore>>) -> Result<Json<Vec<Branch>>> {
    Ok(Json(store.list_branches(Window::ALL).await?))
}

pub async fn get(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Branch>> {
    Ok(Json(find(store.as_ref(), id).await?))
}

pub async fn get_by_tax_id(
    State(store): State<Arc<dyn FleetStore>>,
    Path(tax_id): Path<String>,
) -> Result<Json<Branch>> {
    Ok(Json(find_by_tax_id(store.as_ref(), &tax_id).await?))
}

pub async fn create(
    State(store): State<Arc<dyn FleetStore>>,
    ValidatedJson(req): ValidatedJson<BranchRequest>,
) -> Result<Response> {
    let branch = register(store.as_ref(), req).await?;
    let location = format!("/api/v1/branches/{}", branch.id);
    Ok(StoredResponse::created(location, &branch)?.into_response())
}

/// Replaces a branch's fields and address. Shared by v1 and v2.
pub async fn update(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<BranchRequest>,
) -> Result<StatusCode> {
    let mut branch = find(store.as_ref(), id).await?;
    branch.apply(req);

    if !store.update_branch(&branch).await? {
        return Err(AppError::not_found("Branch", id));
    }
    tracing::info!(branch_id = %id, "branch updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Closes a branch as of today (UTC). Repeating it is a no-op.
pub async fn close(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let today = OffsetDateTime::now_utc().date();
    lifecycle::close_branch(store.as_ref(), id, today).await?;
    Ok(StatusCode::NO_CONTENT)
}

// v2: paged listings, links, idempotent creation

pub async fn list_page(
    State(store): State<Arc<dyn FleetStore>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Linked<Branch>>>> {
    let listing = BranchListing {
        store: store.as_ref(),
    };
    let page = paginate(&listing, &params).await?;
    Ok(Json(page.map(HasLinks::linked)))
}

pub async fn get_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Linked<Branch>>> {
    Ok(Json(find(store.as_ref(), id).await?.linked()))
}

pub async fn get_by_tax_id_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(tax_id): Path<String>,
) -> Result<Json<Linked<Branch>>> {
    Ok(Json(find_by_tax_id(store.as_ref(), &tax_id).await?.linked()))
}

pub async fn create_idempotent(
    State(state): State<AppState>,
    key: IdempotencyKey,
    ValidatedJson(req): ValidatedJson<BranchRequest>,
) -> Result<Response> {
    let payload = req.clone();
    state
        .idempotency
        .execute(&key, CREATE_SCOPE, &payload, || async {
            let branch = register(state.store.as_ref(), req).await?;
            StoredResponse::created(branch_href(branch.id), &branch.linked())
        })
        .await
}
