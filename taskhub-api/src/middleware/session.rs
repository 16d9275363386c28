/// Session cookie authentication
///
/// Protected routes sit behind [`session_auth_layer`], which reads the
/// `session_id` cookie, resolves it through the user service and puts an
/// [`AuthContext`] into the request extensions for handlers to pick up with
/// `Extension<AuthContext>`.
///
/// # Cookie Format
///
/// ```text
/// session_id=<token>; HttpOnly; Path=/; SameSite=Strict[; Max-Age=<secs>][; Secure]
/// ```
///
/// Without `Max-Age` the cookie lives for the browser session only.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use taskhub_shared::auth::session_token::validate_session_token_format;
use taskhub_shared::error::ErrorCode;
use taskhub_shared::models::User;
use taskhub_shared::services::ServiceError;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_id";

/// Authenticated caller, available to protected handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The signed-in user
    pub user: User,

    /// Plaintext token from the cookie, needed for logout
    pub session_token: String,
}

/// Session authentication middleware layer
///
/// # Errors
///
/// - 401 Unauthorized: No cookie, a malformed or unknown or expired session,
///   or the session's user no longer exists
pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(req.headers()).ok_or_else(ApiError::not_authenticated)?;

    // Cookies we could never have issued skip the store lookup
    if !validate_session_token_format(&token) {
        return Err(invalid_session());
    }

    let user = match state.users.get_current_user(&token).await {
        Ok(user) => user,
        Err(
            ServiceError::InvalidSession
            | ServiceError::UserNotFound
            | ServiceError::MissingField(_),
        ) => return Err(invalid_session()),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(user_id = %user.id, "Session resolved");

    req.extensions_mut().insert(AuthContext {
        user,
        session_token: token,
    });

    Ok(next.run(req).await)
}

fn invalid_session() -> ApiError {
    ApiError::Unauthorized(ErrorCode::InvalidSession, "invalid session".to_string())
}

/// Reads the session token from the `Cookie` header(s)
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds the `Set-Cookie` value for a new session
///
/// `max_age_secs` of `None` produces a browser-session cookie.
pub fn session_cookie(token: &str, max_age_secs: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; Path=/; SameSite=Strict", SESSION_COOKIE, token);

    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

/// Builds the `Set-Cookie` value that removes the session cookie
pub fn expired_session_cookie(secure: bool) -> String {
    session_cookie("", Some(0), secure)
}

/// Wraps a cookie string into a header map
pub fn set_cookie_headers(cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie).map_err(|e| {
        ApiError::InternalError(ErrorCode::Internal, format!("invalid cookie value: {}", e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_token() {
        assert_eq!(
            extract_session_token(&with_cookie("theme=dark; session_id=abc123; lang=en")),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_session_token(&with_cookie("session_id=xyz")),
            Some("xyz".to_string())
        );
        assert_eq!(extract_session_token(&with_cookie("session_id=")), None);
        assert_eq!(extract_session_token(&with_cookie("other_session_id=abc")), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_persistent() {
        let cookie = session_cookie("tok", Some(604800), false);
        assert_eq!(
            cookie,
            "session_id=tok; HttpOnly; Path=/; SameSite=Strict; Max-Age=604800"
        );
    }

    #[test]
    fn test_session_cookie_browser_session_secure() {
        let cookie = session_cookie("tok", None, true);
        assert!(!cookie.contains("Max-Age"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = expired_session_cookie(false);
        assert!(cookie.starts_with("session_id=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
