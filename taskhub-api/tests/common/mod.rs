/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - A router over fresh in-memory repositories
/// - Request builders with JSON bodies and session cookies
/// - Response body helpers
/// - Account registration helper

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, LifetimeConfig, RateLimitConfig};
use taskhub_shared::redis::RedisConfig;
use taskhub_shared::repository::Repositories;
use tower::Service as _;

pub const PASSWORD: &str = "secret1!";

/// Test context holding a router with its own empty store
pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    /// Router with a generous rate limit
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Router allowing `requests_per_minute` requests per client address
    pub fn with_rate_limit(requests_per_minute: u64) -> Self {
        let mut config = test_config();
        config.rate_limit = RateLimitConfig { requests_per_minute };
        Self::with_config(config)
    }

    /// Router over an arbitrary configuration
    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(Repositories::in_memory(), None, config);
        Self {
            app: build_router(state),
        }
    }

    /// Sends a request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Registers an account and returns its session cookie (`session_id=...`)
    pub async fn register(&self, email: &str, display_name: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/v1/auth/register",
                None,
                serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "displayName": display_name,
                }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        session_cookie(&response).expect("register sets a session cookie")
    }

    /// Creates a task and returns its JSON rendering
    pub async fn create_task(&self, cookie: &str, description: &str, category: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/v1/tasks",
                Some(cookie),
                serde_json::json!({ "description": description, "category": category }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }
}

/// Development configuration with a generous rate limit
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            cors_origins: vec!["*".to_string()],
        },
        redis: RedisConfig::local(),
        lifetimes: LifetimeConfig::default(),
        rate_limit: RateLimitConfig {
            requests_per_minute: 1000,
        },
    }
}

/// Builds a request with a JSON body
pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7");

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// Builds a request without a body
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7");

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::empty()).unwrap()
}

/// Extracts `session_id=<token>` from the response's Set-Cookie header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Raw Set-Cookie header for the session cookie
pub fn set_cookie_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Reads and parses a JSON response body
pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
