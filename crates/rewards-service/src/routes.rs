//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, bonuses, health, referrals, wallet};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/plans` - Plan catalogue
///
/// ## Accounts (JWT auth)
/// - `POST /v1/accounts` - Create account on first sign-in
/// - `GET /v1/accounts/me` - Get current user's account
/// - `PATCH /v1/accounts/me` - Edit profile
///
/// ## Referrals (JWT auth)
/// - `POST /v1/referrals/claim` - Link the caller to a referrer
/// - `GET /v1/referrals/stats` - Link, referrer, count, coins earned
/// - `GET /v1/referrals` - Referrals made by the caller
///
/// ## Wallet (JWT auth)
/// - `GET /v1/wallet` - Plan, coins, XP
/// - `POST /v1/wallet/plan` - Select a plan
/// - `GET /v1/wallet/ledger` - Ledger entries
///
/// ## Bonuses (JWT auth)
/// - `GET /v1/bonuses` - Progress towards each bonus
/// - `POST /v1/bonuses/:bonus_id/claim` - Claim a bonus
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route(
            "/accounts/me",
            get(accounts::get_account).patch(accounts::update_account),
        )
        // Referrals
        .route("/referrals", get(referrals::list_referrals))
        .route("/referrals/claim", post(referrals::claim_referral))
        .route("/referrals/stats", get(referrals::referral_stats))
        // Plans and wallet
        .route("/plans", get(wallet::list_plans))
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/plan", post(wallet::select_plan))
        .route("/wallet/ledger", get(wallet::list_ledger))
        // Bonuses
        .route("/bonuses", get(bonuses::list_bonuses))
        .route("/bonuses/:bonus_id/claim", post(bonuses::claim_bonus))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
