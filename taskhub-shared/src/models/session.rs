/// Session model
///
/// A session proves a prior successful authentication. The plaintext token is
/// handed to the client exactly once (in the session cookie); the store only
/// ever sees its SHA-256 hash.
///
/// Sessions have a fixed lifetime set at creation. Expiry is enforced by the
/// store's key TTL, never by polling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default session lifetime (7 days)
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Stored session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// SHA-256 hex digest of the session token
    pub token_hash: String,

    /// Owning user
    pub user_id: Uuid,

    /// When the session was issued
    pub created_at: DateTime<Utc>,

    /// When the session stops resolving
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session issued now that lives for `ttl`
    pub fn new(token_hash: String, user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            token_hash,
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Remaining lifetime in whole seconds, at least 1
    ///
    /// Used as the store TTL; a zero TTL is rejected by Redis.
    pub fn ttl_seconds(&self) -> u64 {
        let remaining = (self.expires_at - Utc::now()).num_seconds();
        remaining.max(1) as u64
    }

    /// Returns true once `now` has reached the expiry time
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
