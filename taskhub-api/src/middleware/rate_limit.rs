/// Per-IP rate limiting middleware
///
/// Fixed-window counting: every client IP gets `RATE_LIMIT_PER_MINUTE`
/// requests per wall-clock minute. The counter lives in the store under
/// `ratelimit:ip:{ip}:{window}` and expires with its window, so every API
/// instance shares the same budget.
///
/// # Client Identification
///
/// The peer address from `ConnectInfo` when the server was started with
/// connect info, otherwise the first `X-Forwarded-For` entry, otherwise
/// `"unknown"`.
///
/// # Headers
///
/// Every response carries:
/// - `X-RateLimit-Limit`: Requests allowed per window
/// - `X-RateLimit-Remaining`: Requests left in the current window
/// - `X-RateLimit-Reset`: Unix timestamp when the window ends
/// - `Retry-After`: Seconds to wait (429 responses only)

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::net::SocketAddr;
use taskhub_shared::redis::keys::rate_limit_key;

/// Window length in seconds
pub const WINDOW_SECS: u64 = 60;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Outcome of counting one request against a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub ok: bool,

    /// Requests allowed per window
    pub limit: u64,

    /// Requests left in the window
    pub remaining: u64,

    /// Unix timestamp when the window ends
    pub reset_at: u64,

    /// Seconds until the window ends
    pub retry_after: u64,
}

impl RateLimitResult {
    /// Evaluates the `count`-th request of the window containing `now`
    pub fn evaluate(count: u64, limit: u64, now: u64) -> Self {
        let reset_at = (now / WINDOW_SECS + 1) * WINDOW_SECS;

        Self {
            ok: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            retry_after: reset_at - now,
        }
    }

    fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(LIMIT_HEADER, HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER, HeaderValue::from(self.remaining));
        headers.insert(RESET_HEADER, HeaderValue::from(self.reset_at));
    }
}

/// Rate limiting middleware layer
///
/// If the counter store is unreachable the request is let through and the
/// failure is logged.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.rate_limit.requests_per_minute;
    let now = Utc::now().timestamp().max(0) as u64;
    let ip = client_ip(&request);
    let key = rate_limit_key(&format!("ip:{}", ip), now / WINDOW_SECS);

    let count = match state.rate_limits.hit(&key, WINDOW_SECS).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(error = %e, ip = %ip, "Rate limit check failed, allowing request");
            return next.run(request).await;
        }
    };

    let result = RateLimitResult::evaluate(count, limit, now);

    let mut response = if result.ok {
        next.run(request).await
    } else {
        tracing::warn!(ip = %ip, count, limit, "Rate limit exceeded");
        ApiError::RateLimitExceeded {
            retry_after: result.retry_after,
            message: format!(
                "rate limit exceeded, try again in {} seconds",
                result.retry_after
            ),
        }
        .into_response()
    };

    result.apply_headers(response.headers_mut());
    response
}

/// Best-effort client address for rate limiting
pub fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_evaluate_within_budget() {
        let result = RateLimitResult::evaluate(1, 100, 120);
        assert!(result.ok);
        assert_eq!(result.remaining, 99);
        assert_eq!(result.reset_at, 180);
        assert_eq!(result.retry_after, 60);
    }

    #[test]
    fn test_evaluate_last_allowed_and_first_rejected() {
        let last = RateLimitResult::evaluate(100, 100, 150);
        assert!(last.ok);
        assert_eq!(last.remaining, 0);

        let over = RateLimitResult::evaluate(101, 100, 150);
        assert!(!over.ok);
        assert_eq!(over.remaining, 0);
        assert_eq!(over.retry_after, 30);
    }

    #[test]
    fn test_headers_applied() {
        let mut headers = HeaderMap::new();
        RateLimitResult::evaluate(3, 10, 0).apply_headers(&mut headers);

        assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "10");
        assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "7");
        assert_eq!(headers.get("X-RateLimit-Reset").unwrap(), "60");
    }

    #[test]
    fn test_client_ip_sources() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.7");

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_ip(&request), "192.0.2.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&bare), "unknown");
    }
}
