//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use beamcast_api::router::build_router;
use beamcast_api::state::AppState;
use beamcast_core::config::AppConfig;
use beamcast_realtime::RealtimeEngine;
use beamcast_realtime::auth::ChannelAuth;

/// Shared secret used by test applications.
pub const TEST_SECRET: &str = "top";

/// Test application context.
pub struct TestApp {
    /// The Axum router for making test requests.
    pub router: Router,
    /// Application config.
    pub config: AppConfig,
    /// The realtime engine behind the router.
    pub engine: Arc<RealtimeEngine>,
}

impl TestApp {
    /// Create a new test application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application over the given configuration.
    pub fn with_config(mut config: AppConfig) -> Self {
        config.auth.secret = TEST_SECRET.to_string();

        let auth = Arc::new(ChannelAuth::new(&config.auth.secret));
        let engine = Arc::new(RealtimeEngine::new(config.limits.clone(), auth.clone()));

        let state = AppState {
            config: Arc::new(config.clone()),
            engine: engine.clone(),
            auth,
            stats: engine.clone(),
        };

        Self {
            router: build_router(state),
            config,
            engine,
        }
    }

    /// Make an HTTP request to the test app.
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        self.request_with_headers(method, path, body, &[]).await
    }

    /// Make an HTTP request with extra headers.
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Parsed JSON body.
    pub body: Value,
}
