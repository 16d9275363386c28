/// User model
///
/// A user is an identity plus credentials. Users are created on registration
/// and updated on profile or password change; they are never deleted.
///
/// # Storage
///
/// ```text
/// user:{id}            HASH   id, email, display_name, password_hash,
///                             is_admin, created_at, updated_at
/// user:email:{email}   STRING user id (SET NX, enforces email uniqueness)
/// ```
///
/// # Example
///
/// ```
/// use taskhub_shared::models::user::{CreateUser, User};
///
/// let user = User::new(CreateUser {
///     email: "alice@example.com".to_string(),
///     display_name: "Alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// });
///
/// // The password hash never reaches the wire
/// let json = serde_json::to_value(&user).unwrap();
/// assert!(json.get("passwordHash").is_none());
/// assert_eq!(json["displayName"], "Alice");
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum display name length (characters)
pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4), immutable
    pub id: Uuid,

    /// Email address, unique across all users (case-sensitive as stored)
    pub email: String,

    /// Display name (1-255 characters)
    pub display_name: String,

    /// Argon2id password hash
    ///
    /// Never serialized, so a user rendered as JSON cannot leak it.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Administrator flag
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub display_name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

impl User {
    /// Builds a fresh user record with a generated ID and current timestamps
    pub fn new(data: CreateUser) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            email: data.email,
            display_name: data.display_name,
            password_hash: data.password_hash,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}
