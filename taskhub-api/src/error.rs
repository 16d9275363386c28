/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "task not found", "code": "3009" }
/// ```
///
/// with an optional `details` object for request validation failures.
///
/// # Example
///
/// ```
/// use taskhub_api::error::{ApiError, ApiResult};
/// use taskhub_shared::error::ErrorCode;
///
/// fn parse_flag(raw: &str) -> ApiResult<bool> {
///     raw.parse()
///         .map_err(|_| ApiError::BadRequest(ErrorCode::InvalidRequest, "expected a boolean".to_string()))
/// }
///
/// assert!(parse_flag("true").unwrap());
/// assert!(parse_flag("maybe").is_err());
/// ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskhub_shared::error::ErrorCode;
use taskhub_shared::repository::RepositoryError;
use taskhub_shared::services::ServiceError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(ErrorCode, String),

    /// Unauthorized (401)
    Unauthorized(ErrorCode, String),

    /// Not found (404)
    NotFound(ErrorCode, String),

    /// Conflict (409) - duplicate email, stale state transitions
    Conflict(ErrorCode, String),

    /// Unprocessable entity (422) - request shape validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    RateLimitExceeded { retry_after: u64, message: String },

    /// Internal server error (500); the message is logged, never returned
    InternalError(ErrorCode, String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Numeric error code (e.g. "3004")
    pub code: String,

    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// 401 for requests without a usable session
    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized(ErrorCode::Unauthorized, "authentication required".to_string())
    }

    /// Numeric code carried in the response body
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(code, _)
            | ApiError::Unauthorized(code, _)
            | ApiError::NotFound(code, _)
            | ApiError::Conflict(code, _)
            | ApiError::InternalError(code, _) => *code,
            ApiError::ValidationError(_) => ErrorCode::InvalidRequest,
            ApiError::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(_, msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(_, msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(_, msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(_, msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { message, .. } => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            ApiError::InternalError(_, msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();

        // Handle rate limit separately to add Retry-After header
        if let ApiError::RateLimitExceeded { retry_after, message } = self {
            let body = Json(ErrorResponse {
                error: message,
                code,
                details: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            return response;
        }

        let (status, message, details) = match self {
            ApiError::BadRequest(_, msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(_, msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::NotFound(_, msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(_, msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "request validation failed".to_string(),
                Some(serde_json::json!({ "fields": errors })),
            ),
            ApiError::RateLimitExceeded { message, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, message, None)
            }
            ApiError::InternalError(_, msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(code = %code, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert service errors to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = err.code();
        let message = err.to_string();

        match err {
            ServiceError::MissingField(_)
            | ServiceError::InvalidEmail
            | ServiceError::InvalidDisplayName
            | ServiceError::WeakPassword
            | ServiceError::InvalidDescription(_)
            | ServiceError::InvalidCategory(_)
            | ServiceError::InvalidFilters(_) => ApiError::BadRequest(code, message),

            ServiceError::InvalidCredentials | ServiceError::InvalidSession => {
                ApiError::Unauthorized(code, message)
            }

            ServiceError::UserNotFound
            | ServiceError::TaskNotFound
            | ServiceError::CategoryNotFound => ApiError::NotFound(code, message),

            ServiceError::UserAlreadyExists
            | ServiceError::TaskAlreadyDeleted
            | ServiceError::TaskNotDeleted
            | ServiceError::RestoreWindowExpired => ApiError::Conflict(code, message),

            ServiceError::Password(_) => ApiError::InternalError(code, message),
            ServiceError::Repository(repo) => repo.into(),
        }
    }
}

/// Convert repository errors to API errors
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists => {
                ApiError::Conflict(err.code(), "record already exists".to_string())
            }
            _ => ApiError::InternalError(err.code(), err.to_string()),
        }
    }
}

/// Convert request shape validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}
