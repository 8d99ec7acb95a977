//! Referral bonus integration tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

use rewards_core::UserId;

/// Refer `count` fresh accounts to the test user.
async fn refer_friends(harness: &TestHarness, count: usize) {
    for _ in 0..count {
        let friend = UserId::generate();
        harness.create_account_for(&friend).await;
        let body = harness
            .claim_referral(&friend, json!({ "ref": harness.test_user_id.to_string() }))
            .await;
        assert_eq!(body["outcome"], "linked");
    }
}

#[tokio::test]
async fn progress_tracks_referral_count() {
    let harness = TestHarness::new();
    harness.create_account().await;
    refer_friends(&harness, 3).await;

    let response = harness
        .server
        .get("/v1/bonuses")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["referral_count"], 3);
    let bonuses = body["bonuses"].as_array().unwrap();
    assert_eq!(bonuses[0]["id"], "free_month");
    assert_eq!(bonuses[0]["claimable"], true);
    assert_eq!(bonuses[1]["id"], "premium_features");
    assert_eq!(bonuses[1]["progress"], 3);
    assert_eq!(bonuses[1]["target"], 5);
    assert_eq!(bonuses[1]["claimable"], false);
}

#[tokio::test]
async fn claim_earned_bonus_once() {
    let harness = TestHarness::new();
    harness.create_account().await;
    refer_friends(&harness, 3).await;

    let response = harness
        .server
        .post("/v1/bonuses/free_month/claim")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["bonus_id"], "free_month");
    assert_eq!(body["name"], "Free Month");

    let response = harness
        .server
        .post("/v1/bonuses/free_month/claim")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["bonuses"].as_array().unwrap().len(), 1);
    // Bonuses carry no coins: 100 signup + 3 * 50 referral rewards
    assert_eq!(body["wallet"]["coins"], 250);
}

#[tokio::test]
async fn unearned_bonus_is_refused() {
    let harness = TestHarness::new();
    harness.create_account().await;
    refer_friends(&harness, 1).await;

    let response = harness
        .server
        .post("/v1/bonuses/premium_features/claim")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bonus_not_earned");
    assert_eq!(body["error"]["details"]["progress"], 1);
    assert_eq!(body["error"]["details"]["target"], 5);
}

#[tokio::test]
async fn unknown_bonus_is_not_found() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/bonuses/lifetime_vip/claim")
        .add_header(AUTHORIZATION, harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}
