/// Error codes shared by every layer
///
/// Codes are numeric strings grouped by the subsystem that raises them:
///
/// - `1xxx`: system (unexpected failures)
/// - `2xxx`: repository (key-value store access and record decoding)
/// - `3xxx`: service (validation and business rules)
/// - `4xxx`: handler (request shape, authentication, rate limiting)
///
/// The code travels to clients in the `code` field of every error body, so
/// existing values must never be renumbered.
///
/// # Example
///
/// ```
/// use taskhub_shared::error::ErrorCode;
///
/// assert_eq!(ErrorCode::UserAlreadyExists.as_str(), "3004");
/// assert_eq!(ErrorCode::UserAlreadyExists.to_string(), "3004");
/// ```

use serde::{Serialize, Serializer};
use std::fmt;

/// Numeric error code, grouped by subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // 1xxx system
    Internal,

    // 2xxx repository
    StoreFailure,
    CorruptRecord,
    DuplicateRecord,

    // 3xxx service
    InvalidEmail,
    InvalidDisplayName,
    WeakPassword,
    UserAlreadyExists,
    InvalidCredentials,
    InvalidSession,
    UserNotFound,
    InvalidDescription,
    TaskNotFound,
    TaskAlreadyDeleted,
    TaskNotDeleted,
    RestoreWindowExpired,
    CategoryNotFound,
    InvalidCategory,
    InvalidFilters,
    MissingField,

    // 4xxx handler
    InvalidRequest,
    Unauthorized,
    RateLimitExceeded,
}

impl ErrorCode {
    /// Returns the wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Internal => "1001",

            ErrorCode::StoreFailure => "2001",
            ErrorCode::CorruptRecord => "2002",
            ErrorCode::DuplicateRecord => "2003",

            ErrorCode::InvalidEmail => "3001",
            ErrorCode::InvalidDisplayName => "3002",
            ErrorCode::WeakPassword => "3003",
            ErrorCode::UserAlreadyExists => "3004",
            ErrorCode::InvalidCredentials => "3005",
            ErrorCode::InvalidSession => "3006",
            ErrorCode::UserNotFound => "3007",
            ErrorCode::InvalidDescription => "3008",
            ErrorCode::TaskNotFound => "3009",
            ErrorCode::TaskAlreadyDeleted => "3010",
            ErrorCode::TaskNotDeleted => "3011",
            ErrorCode::RestoreWindowExpired => "3012",
            ErrorCode::CategoryNotFound => "3013",
            ErrorCode::InvalidCategory => "3014",
            ErrorCode::InvalidFilters => "3015",
            ErrorCode::MissingField => "3016",

            ErrorCode::InvalidRequest => "4001",
            ErrorCode::Unauthorized => "4002",
            ErrorCode::RateLimitExceeded => "4003",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
