use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::{
    extract::{Path, Query, ValidatedJson},
    links::{employee_href, HasLinks, Linked},
};
use crate::{
    error::{AppError, Result},
    idempotency::{IdempotencyKey, StoredResponse},
    integrity::{revalidate_branch_reference, validate_branch_reference},
    models::{
        common::{BranchFilter, PageParams},
        employee::{Employee, EmployeeRequest, EmployeeView},
    },
    pagination::{paginate, Page, Window},
    store::{EmployeeListing, FleetStore},
    AppState,
};

const CREATE_SCOPE: &str = "POST /api/v2/employees";

async fn hire(store: &dyn FleetStore, req: EmployeeRequest) -> Result<EmployeeView> {
    let branch = validate_branch_reference(store, req.branch_id).await?;
    let employee = Employee::hire(req);
    store.insert_employee(&employee).await?;
    tracing::info!(employee_id = %employee.id, branch_id = %branch.id, "employee hired");
    Ok(EmployeeView::new(employee, branch.name))
}

async fn find(store: &dyn FleetStore, id: Uuid) -> Result<EmployeeView> {
    store
        .find_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee", id))
}

async fn find_by_national_id(store: &dyn FleetStore, national_id: &str) -> Result<EmployeeView> {
    store
        .find_employee_by_national_id(national_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee", national_id))
}

// v1

pub async fn list(
    State(store): State<Arc<dyn FleetStore>>,
    Query(filter): Query<BranchFilter>,
) -> Result<Json<Vec<EmployeeView>>> {
    Ok(Json(store.list_employees(filter.branch_id, Window::ALL).await?))
}

pub async fn get(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeeView>> {
    Ok(Json(find(store.as_ref(), id).await?))
}

pub async fn get_by_national_id(
    State(store): State<Arc<dyn FleetStore>>,
    Path(national_id): Path<String>,
) -> Result<Json<EmployeeView>> {
    Ok(Json(find_by_national_id(store.as_ref(), &national_id).await?))
}

pub async fn create(
    State(store): State<Arc<dyn FleetStore>>,
    ValidatedJson(req): ValidatedJson<EmployeeRequest>,
) -> Result<Response> {
    let employee = hire(store.as_ref(), req).await?;
    let location = format!("/api/v1/employees/{}", employee.id);
    Ok(StoredResponse::created(location, &employee)?.into_response())
}

/// Shared by v1 and v2. The branch is re-validated only when it changes.
pub async fn update(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<EmployeeRequest>,
) -> Result<StatusCode> {
    let current = find(store.as_ref(), id).await?;
    revalidate_branch_reference(store.as_ref(), current.branch_id, req.branch_id).await?;

    let employee = Employee::with_id(id, req);
    if !store.update_employee(&employee).await? {
        return Err(AppError::not_found("Employee", id));
    }
    tracing::info!(employee_id = %id, "employee updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !store.delete_employee(id).await? {
        return Err(AppError::not_found("Employee", id));
    }
    tracing::info!(employee_id = %id, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}

// v2

pub async fn list_page(
    State(store): State<Arc<dyn FleetStore>>,
    Query(filter): Query<BranchFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Linked<EmployeeView>>>> {
    let listing = EmployeeListing {
        store: store.as_ref(),
        branch_id: filter.branch_id,
    };
    let page = paginate(&listing, &params).await?;
    Ok(Json(page.map(HasLinks::linked)))
}

pub async fn get_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Linked<EmployeeView>>> {
    Ok(Json(find(store.as_ref(), id).await?.linked()))
}

pub async fn get_by_national_id_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(national_id): Path<String>,
) -> Result<Json<Linked<EmployeeView>>> {
    Ok(Json(find_by_national_id(store.as_ref(), &national_id).await?.linked()))
}

pub async fn create_idempotent(
    State(state): State<AppState>,
    key: IdempotencyKey,
    ValidatedJson(req): ValidatedJson<EmployeeRequest>,
) -> Result<Response> {
    let payload = req.clone();
    state
        .idempotency
        .execute(&key, CREATE_SCOPE, &payload, || async {
            let employee = hire(state.store.as_ref(), req).await?;
            StoredResponse::created(employee_href(employee.id), &employee.linked())
        })
        .await
}
