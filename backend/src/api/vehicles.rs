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
    links::{vehicle_href, HasLinks, Linked},
};
use crate::{
    error::{AppError, Result},
    idempotency::{IdempotencyKey, StoredResponse},
    integrity::{revalidate_branch_reference, validate_branch_reference},
    models::{
        common::{BranchFilter, PageParams},
        vehicle::{normalize_plate, Vehicle, VehicleRequest, VehicleView},
    },
    pagination::{paginate, Page, Window},
    store::{FleetStore, VehicleListing},
    AppState,
};

const CREATE_SCOPE: &str = "POST /api/v2/vehicles";

async fn register(store: &dyn FleetStore, req: VehicleRequest) -> Result<VehicleView> {
    let branch = validate_branch_reference(store, req.branch_id).await?;
    let vehicle = Vehicle::register(req);
    store.insert_vehicle(&vehicle).await?;
    tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "vehicle registered");
    Ok(VehicleView::new(vehicle, branch.name))
}

async fn find(store: &dyn FleetStore, id: Uuid) -> Result<VehicleView> {
    store
        .find_vehicle(id)
        .await?
        .ok_or_else(|| AppError::not_found("Vehicle", id))
}

async fn find_by_plate(store: &dyn FleetStore, plate: &str) -> Result<VehicleView> {
    let plate = normalize_plate(plate);
    store
        .find_vehicle_by_plate(&plate)
        .await?
        .ok_or_else(|| AppError::not_found("Vehicle", plate))
}

// v1

pub async fn list(
    State(store): State<Arc<dyn FleetStore>>,
    Query(filter): Query<BranchFilter>,
) -> Result<Json<Vec<VehicleView>>> {
    Ok(Json(store.list_vehicles(filter.branch_id, Window::ALL).await?))
}

pub async fn get(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleView>> {
    Ok(Json(find(store.as_ref(), id).await?))
}

pub async fn get_by_plate(
    State(store): State<Arc<dyn FleetStore>>,
    Path(plate): Path<String>,
) -> Result<Json<VehicleView>> {
    Ok(Json(find_by_plate(store.as_ref(), &plate).await?))
}

pub async fn create(
    State(store): State<Arc<dyn FleetStore>>,
    ValidatedJson(req): ValidatedJson<VehicleRequest>,
) -> Result<Response> {
    let vehicle = register(store.as_ref(), req).await?;
    let location = format!("/api/v1/vehicles/{}", vehicle.id);
    Ok(StoredResponse::created(location, &vehicle)?.into_response())
}

pub async fn update(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<VehicleRequest>,
) -> Result<StatusCode> {
    let current = find(store.as_ref(), id).await?;
    revalidate_branch_reference(store.as_ref(), current.branch_id, req.branch_id).await?;

    let vehicle = Vehicle::with_id(id, req);
    if !store.update_vehicle(&vehicle).await? {
        return Err(AppError::not_found("Vehicle", id));
    }
    tracing::info!(vehicle_id = %id, "vehicle updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !store.delete_vehicle(id).await? {
        return Err(AppError::not_found("Vehicle", id));
    }
    tracing::info!(vehicle_id = %id, "vehicle deleted");
    Ok(StatusCode::NO_CONTENT)
}

// v2

pub async fn list_page(
    State(store): State<Arc<dyn FleetStore>>,
    Query(filter): Query<BranchFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Linked<VehicleView>>>> {
    let listing = VehicleListing {
        store: store.as_ref(),
        branch_id: filter.branch_id,
    };
    let page = paginate(&listing, &params).await?;
    Ok(Json(page.map(HasLinks::linked)))
}

pub async fn get_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Linked<VehicleView>>> {
    Ok(Json(find(store.as_ref(), id).await?.linked()))
}

pub async fn get_by_plate_linked(
    State(store): State<Arc<dyn FleetStore>>,
    Path(plate): Path<String>,
) -> Result<Json<Linked<VehicleView>>> {
    Ok(Json(find_by_plate(store.as_ref(), &plate).await?.linked()))
}

pub async fn create_idempotent(
    State(state): State<AppState>,
    key: IdempotencyKey,
    ValidatedJson(req): ValidatedJson<VehicleRequest>,
) -> Result<Response> {
    let payload = req.clone();
    state
        .idempotency
        .execute(&key, CREATE_SCOPE, &payload, || async {
            let vehicle = register(state.store.as_ref(), req).await?;
            StoredResponse::created(vehicle_href(vehicle.id), &vehicle.linked())
        })
        .await
}
