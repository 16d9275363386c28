/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration and login (issue a session cookie)
/// - Logout (clears it)
/// - Current user and profile/password changes
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login
/// - `POST /v1/auth/logout` - Logout
/// - `GET /v1/auth/me` - Current user
/// - `PUT /v1/auth/me` - Update display name
/// - `PUT /v1/auth/password` - Change password

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    middleware::session::{expired_session_cookie, session_cookie, set_cookie_headers, AuthContext},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskhub_shared::{models::User, services::AuthSession};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address
    #[validate(length(min = 1, max = 320, message = "Email is required"))]
    pub email: String,

    /// Password (checked against the password policy by the service)
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,

    /// Persistent cookie instead of a browser-session cookie
    #[serde(default)]
    pub remember_me: bool,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New display name
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    /// Replacement password
    #[validate(length(min = 1, max = 1024, message = "New password is required"))]
    pub new_password: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "alice@example.com",
///   "password": "Pass123!",
///   "displayName": "Alice"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the user (no password field) and a persistent
/// `session_id` cookie.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email, display name or weak password
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Missing fields
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, axum::http::HeaderMap, Json<User>)> {
    let auth = state
        .users
        .register(&req.email, &req.display_name, &req.password)
        .await?;

    let headers = set_cookie_headers(&cookie_for(&state, &auth))?;

    Ok((StatusCode::CREATED, headers, Json(auth.user)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "alice@example.com",
///   "password": "Pass123!",
///   "rememberMe": true
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials (same for unknown email and wrong password)
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(axum::http::HeaderMap, Json<User>)> {
    let auth = state
        .users
        .login(&req.email, &req.password, req.remember_me)
        .await?;

    let headers = set_cookie_headers(&cookie_for(&state, &auth))?;

    Ok((headers, Json(auth.user)))
}

/// Logout: ends the session and clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<(StatusCode, axum::http::HeaderMap)> {
    state.users.logout(&auth.session_token).await?;

    tracing::info!(user_id = %auth.user.id, "User logged out");

    let headers = set_cookie_headers(&expired_session_cookie(state.secure_cookies()))?;
    Ok((StatusCode::NO_CONTENT, headers))
}

/// Returns the signed-in user
pub async fn current_user(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Changes the signed-in user's display name
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .update_profile(auth.user.id, &req.display_name)
        .await?;

    Ok(Json(user))
}

/// Changes the signed-in user's password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `400 Bad Request`: New password does not meet requirements
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .users
        .change_password(auth.user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Persistent for the session lifetime when asked, browser-session otherwise
fn cookie_for(state: &AppState, auth: &AuthSession) -> String {
    let max_age = auth
        .remember_me
        .then(|| state.users.session_ttl().num_seconds());

    session_cookie(&auth.token, max_age, state.secure_cookies())
}
