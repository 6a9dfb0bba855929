//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock stages injected, so requests run the full intake flow without
//! simulated latency.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use focus_core::{
    testing::{MockSessionStore, MockStage},
    Config, DatabaseConfig, IntakeOrchestrator, ProcessingPipeline, ServerConfig, SessionStore,
    SqliteSessionStore,
};

/// Re-export fixtures for test convenience
pub use focus_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - The compression stage (`compress`)
/// - The audio extraction stage (`extract`)
/// - Optionally the session store (`mock_store`)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_session_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/sessions", json!({
///         "userId": "alice",
///         "startTime": "2024-01-01T10:00:00Z",
///         "endTime": "2024-01-01T12:00:00Z"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock compression stage
    pub compress: MockStage,
    /// Mock audio extraction stage
    pub extract: MockStage,
    /// Mock store, when the fixture was built with one
    pub mock_store: Option<MockSessionStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture backed by a SQLite store in a temp dir.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Create a fixture backed by a [`MockSessionStore`].
    pub fn with_mock_store() -> Self {
        Self::build(true)
    }

    fn build(mock_store: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Config::default()
        };

        let compress = MockStage::new("compress");
        let extract = MockStage::new("extract-audio");

        let (store, mock_store): (Arc<dyn SessionStore>, _) = if mock_store {
            let store = MockSessionStore::new();
            (Arc::new(store.clone()), Some(store))
        } else {
            (
                Arc::new(
                    SqliteSessionStore::new(&db_path).expect("Failed to create session store"),
                ),
                None,
            )
        };

        let pipeline =
            ProcessingPipeline::new(Arc::new(compress.clone()), Arc::new(extract.clone()));
        let orchestrator = Arc::new(IntakeOrchestrator::new(pipeline, store));

        let state = Arc::new(focus_server::state::AppState::new(config, orchestrator));
        let router = focus_server::api::create_router(state);

        Self {
            router,
            compress,
            extract,
            mock_store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Send a POST request with custom content type (for testing wrong content types).
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        self.request_raw("POST", path, body, content_type).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request with raw string body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
