/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use taskhub_shared::redis::RedisClient;
/// use taskhub_shared::repository::Repositories;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let redis = RedisClient::new(config.redis.clone()).await?;
/// let state = AppState::new(Repositories::redis(redis.clone()), Some(redis), config);
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{rate_limit::rate_limit_layer, security::SecurityHeadersLayer, session::session_auth_layer},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use taskhub_shared::redis::RedisClient;
use taskhub_shared::repository::{RateLimitRepository, Repositories};
use taskhub_shared::services::{TaskService, UserService};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and sessions
    pub users: Arc<UserService>,

    /// Tasks and categories
    pub tasks: Arc<TaskService>,

    /// Per-IP request counters
    pub rate_limits: Arc<dyn RateLimitRepository>,

    /// Store client for health checks; None when running on in-memory repositories
    pub redis: Option<RedisClient>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services over a set of repositories
    pub fn new(repos: Repositories, redis: Option<RedisClient>, config: Config) -> Self {
        let users = UserService::new(repos.users, repos.sessions)
            .with_session_ttl(Duration::days(config.lifetimes.session_ttl_days));
        let tasks = TaskService::new(repos.tasks)
            .with_retention(Duration::days(config.lifetimes.task_retention_days));

        Self {
            users: Arc::new(users),
            tasks: Arc::new(tasks),
            rate_limits: repos.rate_limits,
            redis,
            config: Arc::new(config),
        }
    }

    /// Whether session cookies carry the `Secure` flag
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                     # Health check (public)
/// └── /v1/                            # API v1 (rate limited per IP)
///     ├── /auth/
///     │   ├── POST /register          # public
///     │   ├── POST /login             # public
///     │   ├── POST /logout            # session
///     │   ├── GET  /me                # session
///     │   ├── PUT  /me                # session
///     │   └── PUT  /password          # session
///     ├── /tasks/                     # session
///     │   ├── GET    /
///     │   ├── POST   /
///     │   ├── GET    /:id
///     │   ├── DELETE /:id
///     │   ├── PUT    /:id/complete
///     │   └── POST   /:id/restore
///     └── /categories/                # session
///         ├── GET    /
///         ├── PUT    /:name
///         └── DELETE /:name
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Response compression (gzip, brotli)
/// 4. Logging (tower-http TraceLayer)
/// 5. Rate limiting (`/v1` only)
/// 6. Session authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth, not rate limited)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes that create a session
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Auth routes that need a session
    let session_auth_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route(
            "/me",
            get(routes::auth::current_user).put(routes::auth::update_profile),
        )
        .route("/password", put(routes::auth::change_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task).delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", put(routes::tasks::update_completion))
        .route("/:id/restore", post(routes::tasks::restore_task))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let category_routes = Router::new()
        .route("/", get(routes::categories::list_categories))
        .route(
            "/:name",
            put(routes::categories::rename_category).delete(routes::categories::delete_category),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_auth_routes))
        .nest("/tasks", task_routes)
        .nest("/categories", category_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
        // Development only: any origin, never with credentials
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}
