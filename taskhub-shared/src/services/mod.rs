/// Service layer
///
/// Services enforce validation and business rules and orchestrate repository
/// calls. They hold no mutable state of their own; all coordination between
/// concurrent requests is left to the store's per-key atomicity.
///
/// # Services
///
/// - `user`: registration, login, sessions, profile and password changes
/// - `task`: task CRUD, soft delete and restore, category fan-out, cleanup

pub mod task;
pub mod user;

pub use task::TaskService;
pub use user::{AuthSession, UserService};

use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::error::ErrorCode;
use crate::repository::RepositoryError;

/// Service errors
///
/// Messages are safe to show to clients, except for the wrapped
/// infrastructure variants which the HTTP layer replaces with a generic message.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email format")]
    InvalidEmail,

    #[error("display name must be between 1 and 255 characters")]
    InvalidDisplayName,

    #[error("password does not meet requirements")]
    WeakPassword,

    #[error("user already exists")]
    UserAlreadyExists,

    /// Deliberately vague: never reveals whether the email exists
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid session")]
    InvalidSession,

    #[error("user not found")]
    UserNotFound,

    #[error("{0}")]
    InvalidDescription(String),

    #[error("task not found")]
    TaskNotFound,

    #[error("task is already deleted")]
    TaskAlreadyDeleted,

    #[error("task is not deleted")]
    TaskNotDeleted,

    #[error("restore window has expired")]
    RestoreWindowExpired,

    #[error("category not found")]
    CategoryNotFound,

    #[error("{0}")]
    InvalidCategory(String),

    #[error("invalid filters: {0}")]
    InvalidFilters(String),

    #[error("password operation failed: {0}")]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::MissingField(_) => ErrorCode::MissingField,
            ServiceError::InvalidEmail => ErrorCode::InvalidEmail,
            ServiceError::InvalidDisplayName => ErrorCode::InvalidDisplayName,
            ServiceError::WeakPassword => ErrorCode::WeakPassword,
            ServiceError::UserAlreadyExists => ErrorCode::UserAlreadyExists,
            ServiceError::InvalidCredentials => ErrorCode::InvalidCredentials,
            ServiceError::InvalidSession => ErrorCode::InvalidSession,
            ServiceError::UserNotFound => ErrorCode::UserNotFound,
            ServiceError::InvalidDescription(_) => ErrorCode::InvalidDescription,
            ServiceError::TaskNotFound => ErrorCode::TaskNotFound,
            ServiceError::TaskAlreadyDeleted => ErrorCode::TaskAlreadyDeleted,
            ServiceError::TaskNotDeleted => ErrorCode::TaskNotDeleted,
            ServiceError::RestoreWindowExpired => ErrorCode::RestoreWindowExpired,
            ServiceError::CategoryNotFound => ErrorCode::CategoryNotFound,
            ServiceError::InvalidCategory(_) => ErrorCode::InvalidCategory,
            ServiceError::InvalidFilters(_) => ErrorCode::InvalidFilters,
            ServiceError::Password(_) => ErrorCode::Internal,
            ServiceError::Repository(err) => err.code(),
        }
    }
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Returns true when a required string is empty or whitespace only
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
