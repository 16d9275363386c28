/// Repository layer
///
/// Repositories translate domain models to and from key-value records and own
/// index maintenance. Each repository is an explicit async trait with two
/// implementations:
///
/// - `redis_store`: backed by Redis, used in production
/// - `memory`: in-process maps, used by tests and local experiments
///
/// Repositories do not validate business rules; that is the services' job.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::redis::{RedisClient, RedisConfig};
/// use taskhub_shared::repository::Repositories;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let repos = Repositories::redis(client);
///
/// let tasks = repos.tasks.list_by_user(uuid::Uuid::new_v4()).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod codec;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::models::{Session, Task, User};
use crate::redis::RedisClient;

/// Repository errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated
    #[error("Record already exists")]
    AlreadyExists,

    /// A stored record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The store rejected or failed the operation
    #[error("Store error: {0}")]
    Store(String),
}

impl RepositoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RepositoryError::AlreadyExists => ErrorCode::DuplicateRecord,
            RepositoryError::Corrupt(_) => ErrorCode::CorruptRecord,
            RepositoryError::Store(_) => ErrorCode::StoreFailure,
        }
    }
}

impl From<redis::RedisError> for RepositoryError {
    fn from(err: redis::RedisError) -> Self {
        RepositoryError::Store(err.to_string())
    }
}

/// Repository result type alias
pub type RepoResult<T> = Result<T, RepositoryError>;

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user
    ///
    /// Fails with `AlreadyExists` when another user already owns the email.
    async fn create(&self, user: &User) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Looks a user up by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Overwrites a user's mutable fields
    async fn update(&self, user: &User) -> RepoResult<()>;
}

/// Session persistence
///
/// Sessions are keyed by token hash and expire on their own.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a session that expires at `session.expires_at`
    async fn create(&self, session: &Session) -> RepoResult<()>;

    /// Resolves a live session to its user
    async fn find_user_id(&self, token_hash: &str) -> RepoResult<Option<Uuid>>;

    /// Removes a session, returning whether it existed
    async fn delete(&self, token_hash: &str) -> RepoResult<bool>;
}

/// Task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and adds it to its owner's index
    async fn create(&self, task: &Task) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>>;

    /// All non-purged tasks of a user, in no particular order
    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Task>>;

    /// Overwrites a task and keeps the deleted index in step with `deleted_at`
    async fn update(&self, task: &Task) -> RepoResult<()>;

    /// Permanently removes a task and its index entries, returning whether it existed
    async fn delete(&self, task: &Task) -> RepoResult<bool>;

    /// Soft-deleted tasks (any user) whose `deleted_at` is at or before `cutoff`
    async fn list_deleted_before(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<Task>>;
}

/// Fixed-window request counters
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Increments the counter under `key`, returning the new count
    ///
    /// The counter disappears `window_secs` after its first hit.
    async fn hit(&self, key: &str, window_secs: u64) -> RepoResult<u64>;
}

/// The full set of repositories, sharing one backing store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub rate_limits: Arc<dyn RateLimitRepository>,
}

impl Repositories {
    /// Repositories backed by Redis
    pub fn redis(client: RedisClient) -> Self {
        Self {
            users: Arc::new(redis_store::RedisUserRepository::new(client.clone())),
            sessions: Arc::new(redis_store::RedisSessionRepository::new(client.clone())),
            tasks: Arc::new(redis_store::RedisTaskRepository::new(client.clone())),
            rate_limits: Arc::new(redis_store::RedisRateLimitRepository::new(client)),
        }
    }

    /// Repositories backed by in-process maps
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::InMemoryUserRepository::default()),
            sessions: Arc::new(memory::InMemorySessionRepository::default()),
            tasks: Arc::new(memory::InMemoryTaskRepository::default()),
            rate_limits: Arc::new(memory::InMemoryRateLimitRepository::default()),
        }
    }
}
