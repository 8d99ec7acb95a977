//! Common test utilities for rewards integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use rewards_core::UserId;
use rewards_service::{create_router, AppState, ServiceConfig, StorageBackend};
use rewards_store::{MemoryStore, Store};

/// Origin used to build referral links in tests.
pub const TEST_ORIGIN: &str = "https://example.com";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store behind the server.
    pub store: Arc<dyn Store>,
    /// Temporary directory for an on-disk database (kept alive for test duration).
    pub _temp_dir: Option<TempDir>,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), StorageBackend::Memory, None)
    }

    /// Create a new test harness with a fresh `RocksDB` database.
    #[cfg(feature = "rocksdb-backend")]
    pub fn with_rocksdb() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = rewards_store::RocksStore::open(temp_dir.path()).expect("Failed to open store");
        Self::with_store(Arc::new(store), StorageBackend::Rocksdb, Some(temp_dir))
    }

    fn with_store(
        store: Arc<dyn Store>,
        storage_backend: StorageBackend,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let data_dir = temp_dir
            .as_ref()
            .map(|dir| dir.path().to_string_lossy().to_string())
            .unwrap_or_default();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir,
            storage_backend,
            public_origin: TEST_ORIGIN.into(),
            auth_base_url: "http://localhost".into(),
            auth_issuer: "http://localhost".into(),
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id: UserId::generate(),
        }
    }

    /// Get the authorization header for the test user.
    pub fn user_auth_header(&self) -> HeaderValue {
        Self::auth_header_for(&self.test_user_id)
    }

    /// Get the authorization header for any user.
    pub fn auth_header_for(user_id: &UserId) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer test-token:{user_id}"))
            .expect("test token is a valid header value")
    }

    /// Create an account for `user_id` through the API.
    pub async fn create_account_for(&self, user_id: &UserId) -> Value {
        let response = self
            .server
            .post("/v1/accounts")
            .add_header(
                axum::http::header::AUTHORIZATION,
                Self::auth_header_for(user_id),
            )
            .json(&json!({}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Create the test user's account through the API.
    pub async fn create_account(&self) -> Value {
        self.create_account_for(&self.test_user_id).await
    }

    /// Claim a referral for `user_id` and return the response body.
    pub async fn claim_referral(&self, user_id: &UserId, body: Value) -> Value {
        let response = self
            .server
            .post("/v1/referrals/claim")
            .add_header(
                axum::http::header::AUTHORIZATION,
                Self::auth_header_for(user_id),
            )
            .json(&body)
            .await;
        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
