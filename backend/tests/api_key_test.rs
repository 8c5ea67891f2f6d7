mod common;

use serde_json::Value;

#[tokio::test]
async fn v2_without_key_returns_401() {
    let (addr, _state) = common::setup_test_app_with_api_key().await;

    let resp = common::http_client()
        .get(format!("http://{}/api/v2/branches", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn v2_with_wrong_key_returns_401() {
    let (addr, _state) = common::setup_test_app_with_api_key().await;

    let resp = common::http_client()
        .get(format!("http://{}/api/v2/vehicles", addr))
        .header("X-API-Key", "not-the-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn v2_with_valid_key_is_served() {
    let (addr, _state) = common::setup_test_app_with_api_key().await;

    let resp = common::http_client()
        .get(format!("http://{}/api/v2/employees", addr))
        .header("X-API-Key", common::TEST_API_KEY)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn api_key_is_checked_before_idempotency_key() {
    let (addr, _state) = common::setup_test_app_with_api_key().await;

    let resp = common::http_client()
        .post(format!("http://{}/api/v2/branches", addr))
        .json(&common::branch_payload("Filial Centro", "12345678000101"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn health_and_v1_are_open() {
    let (addr, _state) = common::setup_test_app_with_api_key().await;
    let client = common::http_client();

    let health = client
        .get(format!("http://{}/api/v2/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let v1 = client
        .get(format!("http://{}/api/v1/branches", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(v1.status(), 200);
}
