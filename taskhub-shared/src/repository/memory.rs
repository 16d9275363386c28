/// In-memory repositories
///
/// Drop-in fakes for the Redis repositories. Each repository guards its maps
/// with a single `RwLock`, which gives the same per-record atomicity the
/// Redis versions get from `MULTI/EXEC`.
///
/// The session fake evaluates expiry against its own clock, which tests can
/// move forward with [`InMemorySessionRepository::advance_clock`] to observe
/// TTL eviction without waiting.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    RateLimitRepository, RepoResult, RepositoryError, SessionRepository, TaskRepository,
    UserRepository,
};
use crate::models::{Session, Task, User};

#[derive(Default)]
struct UserTables {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Users held in process memory
#[derive(Default)]
pub struct InMemoryUserRepository {
    tables: RwLock<UserTables>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.tables.write().await;

        if tables.by_email.contains_key(&user.email) {
            return Err(RepositoryError::AlreadyExists);
        }

        tables.by_email.insert(user.email.clone(), user.id);
        tables.by_id.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        self.tables.write().await.by_id.insert(user.id, user.clone());
        Ok(())
    }
}

/// Sessions held in process memory with simulated expiry
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
    clock_offset: RwLock<Duration>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock_offset: RwLock::new(Duration::zero()),
        }
    }
}

impl InMemorySessionRepository {
    /// Moves this repository's notion of "now" forward
    pub async fn advance_clock(&self, by: Duration) {
        *self.clock_offset.write().await += by;
    }

    async fn now(&self) -> DateTime<Utc> {
        Utc::now() + *self.clock_offset.read().await
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> RepoResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_user_id(&self, token_hash: &str) -> RepoResult<Option<Uuid>> {
        let now = self.now().await;
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get(token_hash) else {
            return Ok(None);
        };

        if !session.is_expired_at(now) {
            return Ok(Some(session.user_id));
        }

        sessions.remove(token_hash);
        Ok(None)
    }

    async fn delete(&self, token_hash: &str) -> RepoResult<bool> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }
}

/// Tasks held in process memory
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> RepoResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, task: &Task) -> RepoResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, task: &Task) -> RepoResult<bool> {
        Ok(self.tasks.write().await.remove(&task.id).is_some())
    }

    async fn list_deleted_before(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| matches!(t.deleted_at, Some(deleted_at) if deleted_at <= cutoff))
            .cloned()
            .collect())
    }
}

/// Request counters held in process memory
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    counters: RwLock<HashMap<String, (u64, DateTime<Utc>)>>,
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn hit(&self, key: &str, window_secs: u64) -> RepoResult<u64> {
        let now = Utc::now();
        let mut counters = self.counters.write().await;

        counters.retain(|_, (_, expires_at)| *expires_at > now);

        let entry = counters
            .entry(key.to_string())
            .or_insert_with(|| (0, now + Duration::seconds(window_secs as i64)));
        entry.0 += 1;

        Ok(entry.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTask, CreateUser};

    fn user(email: &str) -> User {
        User::new(CreateUser {
            email: email.to_string(),
            display_name: "Test".to_string(),
            password_hash: "hash".to_string(),
        })
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let repo = InMemoryUserRepository::default();
        repo.create(&user("a@example.com")).await.unwrap();

        let err = repo.create(&user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists));

        // Case-sensitive as stored
        repo.create(&user("A@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_expires_with_clock() {
        let repo = InMemorySessionRepository::default();
        let user_id = Uuid::new_v4();
        repo.create(&Session::new("h".to_string(), user_id, Duration::days(7)))
            .await
            .unwrap();

        assert_eq!(repo.find_user_id("h").await.unwrap(), Some(user_id));

        repo.advance_clock(Duration::days(7) + Duration::seconds(1))
            .await;
        assert_eq!(repo.find_user_id("h").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_deleted_before() {
        let repo = InMemoryTaskRepository::default();
        let mut old = Task::new(CreateTask {
            user_id: Uuid::new_v4(),
            description: "old".to_string(),
            category: String::new(),
        });
        old.soft_delete(Utc::now() - Duration::days(10));
        repo.create(&old).await.unwrap();

        let mut recent = old.clone();
        recent.id = Uuid::new_v4();
        recent.soft_delete(Utc::now());
        repo.create(&recent).await.unwrap();

        let expired = repo
            .list_deleted_before(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, old.id);
    }

    #[tokio::test]
    async fn test_rate_limit_counts_per_key() {
        let repo = InMemoryRateLimitRepository::default();
        assert_eq!(repo.hit("a", 60).await.unwrap(), 1);
        assert_eq!(repo.hit("a", 60).await.unwrap(), 2);
        assert_eq!(repo.hit("b", 60).await.unwrap(), 1);
    }
}
