#![allow(dead_code)]
use std::{net::SocketAddr, sync::Arc};

use serde_json::{json, Value};
use uuid::Uuid;

use fleet_backend::{
    api,
    auth::ApiKeys,
    config::IdempotencySettings,
    idempotency::{IdempotencyGuard, MemoryIdempotencyStore},
    store::{FleetStore, MemoryStore},
    AppState,
};

pub const TEST_API_KEY: &str = "test-api-key";

/// Spin up a real Axum server on a random port, backed by fresh in-memory
/// stores. Each call gets its own stores, so tests never see each other's
/// data. The v2 API-key check is disabled.
pub async fn setup_test_app() -> (SocketAddr, AppState) {
    setup_with_keys(&[]).await
}

/// Same as [`setup_test_app`] but with the v2 API-key check enabled.
pub async fn setup_test_app_with_api_key() -> (SocketAddr, AppState) {
    setup_with_keys(&[TEST_API_KEY]).await
}

async fn setup_with_keys(keys: &[&str]) -> (SocketAddr, AppState) {
    let store: Arc<dyn FleetStore> = Arc::new(MemoryStore::new());
    let state = AppState {
        store,
        idempotency: IdempotencyGuard::new(
            Arc::new(MemoryIdempotencyStore::new()),
            IdempotencySettings::default(),
        ),
        api_keys: ApiKeys::new(keys.iter().copied()),
    };

    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Build a reqwest client (reusable across requests in a test).
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn unique_key(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// A tax id that will not collide with other branches created in the same test.
pub fn unique_tax_id() -> String {
    let digits: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(14)
        .collect();
    digits
}

pub fn branch_payload(name: &str, tax_id: &str) -> Value {
    json!({
        "name": name,
        "tax_id": tax_id,
        "phone": "(11) 3333-1001",
        "opening_date": "2020-03-15",
        "address": {
            "postal_code": "01310-100",
            "street": "Av. Paulista",
            "number": "1000",
            "complement": "Conjunto 101",
            "district": "Bela Vista",
            "city": "São Paulo",
            "region_code": "SP",
            "country": "Brasil"
        }
    })
}

pub fn employee_payload(full_name: &str, national_id: &str, branch_id: &str) -> Value {
    json!({
        "full_name": full_name,
        "national_id": national_id,
        "role": "technician",
        "branch_id": branch_id
    })
}

pub fn vehicle_payload(plate: &str, branch_id: &str) -> Value {
    json!({
        "plate": plate,
        "make": "Honda",
        "model": "CG 160",
        "year": 2020,
        "branch_id": branch_id
    })
}

/// Create a branch through v1 and return its id.
pub async fn create_branch(addr: SocketAddr, name: &str) -> String {
    let resp = http_client()
        .post(format!("http://{}/api/v1/branches", addr))
        .json(&branch_payload(name, &unique_tax_id()))
        .send()
        .await
        .expect("Create branch request failed");
    assert_eq!(resp.status(), 201, "Branch creation should return 201");

    let body: Value = resp.json().await.unwrap();
    body["id"].as_str().expect("Branch should have an id").to_string()
}

pub async fn create_employee(
    addr: SocketAddr,
    full_name: &str,
    national_id: &str,
    branch_id: &str,
) -> String {
    let resp = http_client()
        .post(format!("http://{}/api/v1/employees", addr))
        .json(&employee_payload(full_name, national_id, branch_id))
        .send()
        .await
        .expect("Create employee request failed");
    assert_eq!(resp.status(), 201, "Employee creation should return 201");

    let body: Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}
