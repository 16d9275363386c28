/// Redis key naming scheme
///
/// Every key the repositories touch is built here, so the layout lives in
/// one place:
///
/// ```text
/// user:{id}                    HASH    user record
/// user:email:{email}           STRING  user id (uniqueness index)
/// user:{id}:tasks              SET     ids of the user's non-purged tasks
/// session:{token_hash}         STRING  user id, expires with the session
/// task:{id}                    HASH    task record
/// tasks:deleted                ZSET    soft-deleted task ids by deleted_at
/// ratelimit:{scope}:{window}   STRING  request counter
/// ```

use std::fmt::Display;
use uuid::Uuid;

/// Sorted set of soft-deleted task ids, scored by deletion time (unix seconds)
pub const DELETED_TASKS_KEY: &str = "tasks:deleted";

pub fn user_key(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

pub fn user_email_key(email: &str) -> String {
    format!("user:email:{}", email)
}

pub fn user_tasks_key(user_id: Uuid) -> String {
    format!("user:{}:tasks", user_id)
}

pub fn session_key(token_hash: &str) -> String {
    format!("session:{}", token_hash)
}

/// Accepts a `Uuid` or an id string read back from an index
pub fn task_key(task_id: impl Display) -> String {
    format!("task:{}", task_id)
}

pub fn rate_limit_key(scope: &str, window: u64) -> String {
    format!("ratelimit:{}:{}", scope, window)
}
