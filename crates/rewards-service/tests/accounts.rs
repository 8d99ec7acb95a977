//! Account management integration tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Account Creation
// ============================================================================

#[tokio::test]
async fn create_account_success() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .json(&json!({ "display_name": "Aziza", "email": "aziza@example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
    assert_eq!(body["display_name"], "Aziza");
    assert_eq!(body["referral_count"], 0);
    assert_eq!(body["referrer_id"], serde_json::Value::Null);
    assert_eq!(body["wallet"]["plan_id"], "basic");
    assert_eq!(body["wallet"]["coins"], 100);
    assert_eq!(body["referral_code"].as_str().unwrap().len(), 6);
}

#[tokio::test]
async fn create_account_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/accounts").json(&json!({})).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_account_with_bad_token_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer test-token:not valid!"),
        )
        .json(&json!({}))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_account_duplicate_conflicts() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn create_account_writes_signup_entry() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .get("/v1/wallet/ledger")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["kind"], "signup_grant");
    assert_eq!(entries[0]["amount"], 100);
}

// ============================================================================
// Get / Update Account
// ============================================================================

#[tokio::test]
async fn get_account_success() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
    assert_eq!(body["display_name"], "User");
}

#[tokio::test]
async fn get_account_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "account_not_found");
}

#[tokio::test]
async fn update_profile_merges_fields() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .patch("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .json(&json!({ "phone": "+998901234567" }))
        .await;
    response.assert_status_ok();

    let response = harness
        .server
        .patch("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .json(&json!({ "display_name": "Bekzod", "photo_url": "https://cdn.example.com/b.png" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["display_name"], "Bekzod");
    assert_eq!(body["phone"], "+998901234567");
    assert_eq!(body["photo_url"], "https://cdn.example.com/b.png");
}

#[tokio::test]
async fn update_profile_without_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .json(&json!({ "display_name": "Nobody" }))
        .await;

    response.assert_status_not_found();
}
