//! Common test utilities for festa integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use festa_core::FestivalConfig;
use festa_service::{create_router, AppState, ServiceConfig};
use festa_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The station API key for authenticated requests.
    pub station_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let station_api_key = "test-station-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            station_api_key: Some(station_api_key.clone()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            festival: FestivalConfig::default(),
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            station_api_key,
        }
    }

    /// Register an attendee and return their participant ID.
    pub async fn seed_attendee(&self, nickname: &str, grade: u8, qr_token: &str) -> String {
        let response = self
            .server
            .post("/v1/participants")
            .add_header("x-api-key", self.station_api_key.clone())
            .json(&json!({
                "nickname": nickname,
                "grade": grade,
                "class_number": 1,
                "student_number": 1,
                "qr_token": qr_token,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("participant id").to_string()
    }

    /// Register a venue and return its venue ID.
    pub async fn seed_venue(&self, name: &str, qr_token: &str) -> String {
        let response = self
            .server
            .post("/v1/venues")
            .add_header("x-api-key", self.station_api_key.clone())
            .json(&json!({
                "name": name,
                "location": "test hall",
                "qr_token": qr_token,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("venue id").to_string()
    }

    /// Record a visit scan; returns the raw response.
    pub async fn record_visit(
        &self,
        participant_id: &str,
        venue_token: &str,
    ) -> axum_test::TestResponse {
        self.server
            .post("/v1/visits")
            .add_header("x-api-key", self.station_api_key.clone())
            .json(&json!({
                "participant_id": participant_id,
                "venue_token": venue_token,
            }))
            .await
    }

    /// Grant award points; returns the raw response.
    pub async fn award_points(&self, venue_id: &str, qr_token: &str) -> axum_test::TestResponse {
        self.server
            .post("/v1/awards")
            .add_header("x-api-key", self.station_api_key.clone())
            .json(&json!({
                "venue_id": venue_id,
                "qr_token": qr_token,
            }))
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
