/// Redis-backed repositories
///
/// Single-record writes that touch several keys (a task hash plus its index
/// entries) are sent as one `MULTI/EXEC` pipeline, so the record and its
/// indexes never disagree. Writes spanning several records are not
/// transactional; callers fan out one record at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use std::collections::HashMap;
use uuid::Uuid;

use super::codec::{task_from_fields, task_to_fields, user_from_fields, user_to_fields};
use super::{
    RateLimitRepository, RepoResult, RepositoryError, SessionRepository, TaskRepository,
    UserRepository,
};
use crate::models::{Session, Task, User};
use crate::redis::keys::{self, DELETED_TASKS_KEY};
use crate::redis::RedisClient;

/// Users stored as `user:{id}` hashes with a `user:email:{email}` index
#[derive(Clone)]
pub struct RedisUserRepository {
    client: RedisClient,
}

impl RedisUserRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserRepository for RedisUserRepository {
    async fn create(&self, user: &User) -> RepoResult<()> {
        let mut conn = self.client.get_connection();
        let email_key = keys::user_email_key(&user.email);

        // SET NX claims the email atomically; a second registration loses here
        let claimed: bool = conn.set_nx(&email_key, user.id.to_string()).await?;
        if !claimed {
            return Err(RepositoryError::AlreadyExists);
        }

        let fields = user_to_fields(user);
        let written: redis::RedisResult<()> = conn
            .hset_multiple(keys::user_key(user.id), fields.as_slice())
            .await;

        if let Err(e) = written {
            // Release the email so the address is not locked out
            let _: redis::RedisResult<()> = conn.del(&email_key).await;
            return Err(e.into());
        }

        tracing::debug!(user_id = %user.id, "Stored user");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let mut conn = self.client.get_connection();
        let fields: HashMap<String, String> = conn.hgetall(keys::user_key(id)).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        user_from_fields(&fields).map(Some)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut conn = self.client.get_connection();
        let id: Option<String> = conn.get(keys::user_email_key(email)).await?;

        let Some(id) = id else {
            return Ok(None);
        };

        let id = Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Corrupt(format!("email index: {}", e)))?;

        self.find_by_id(id).await
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let fields = user_to_fields(user);
        let mut conn = self.client.get_connection();
        let _: () = conn
            .hset_multiple(keys::user_key(user.id), fields.as_slice())
            .await?;
        Ok(())
    }
}

/// Sessions stored as `session:{token_hash}` strings with a TTL
#[derive(Clone)]
pub struct RedisSessionRepository {
    client: RedisClient,
}

impl RedisSessionRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn create(&self, session: &Session) -> RepoResult<()> {
        let mut conn = self.client.get_connection();
        let _: () = conn
            .set_ex(
                keys::session_key(&session.token_hash),
                session.user_id.to_string(),
                session.ttl_seconds(),
            )
            .await?;

        tracing::debug!(
            user_id = %session.user_id,
            ttl = session.ttl_seconds(),
            "Stored session"
        );
        Ok(())
    }

    async fn find_user_id(&self, token_hash: &str) -> RepoResult<Option<Uuid>> {
        let mut conn = self.client.get_connection();
        let value: Option<String> = conn.get(keys::session_key(token_hash)).await?;

        value
            .map(|id| {
                Uuid::parse_str(&id)
                    .map_err(|e| RepositoryError::Corrupt(format!("session value: {}", e)))
            })
            .transpose()
    }

    async fn delete(&self, token_hash: &str) -> RepoResult<bool> {
        let mut conn = self.client.get_connection();
        let removed: i64 = conn.del(keys::session_key(token_hash)).await?;
        Ok(removed > 0)
    }
}

/// Tasks stored as `task:{id}` hashes, indexed per user and by deletion time
#[derive(Clone)]
pub struct RedisTaskRepository {
    client: RedisClient,
}

impl RedisTaskRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Loads several task hashes in one round trip
    ///
    /// Ids whose hash has vanished are returned separately so callers can
    /// repair the index they came from.
    async fn load_many(&self, ids: &[String]) -> RepoResult<(Vec<Task>, Vec<String>)> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut pipe = redis::pipe();
        for id in ids {
            pipe.hgetall(keys::task_key(id));
        }

        let mut conn = self.client.get_connection();
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut tasks = Vec::with_capacity(rows.len());
        let mut missing = Vec::new();
        for (id, fields) in ids.iter().zip(rows) {
            if fields.is_empty() {
                missing.push(id.clone());
            } else {
                tasks.push(task_from_fields(&fields)?);
            }
        }

        Ok((tasks, missing))
    }
}

#[async_trait]
impl TaskRepository for RedisTaskRepository {
    async fn create(&self, task: &Task) -> RepoResult<()> {
        let fields = task_to_fields(task);
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(keys::task_key(task.id), fields.as_slice())
            .ignore()
            .sadd(keys::user_tasks_key(task.user_id), task.id.to_string())
            .ignore();

        if let Some(deleted_at) = task.deleted_at {
            pipe.zadd(DELETED_TASKS_KEY, task.id.to_string(), deleted_at.timestamp())
                .ignore();
        }

        let mut conn = self.client.get_connection();
        pipe.query_async::<_, ()>(&mut conn).await?;

        tracing::debug!(task_id = %task.id, user_id = %task.user_id, "Stored task");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>> {
        let mut conn = self.client.get_connection();
        let fields: HashMap<String, String> = conn.hgetall(keys::task_key(id)).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        task_from_fields(&fields).map(Some)
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Task>> {
        let index_key = keys::user_tasks_key(user_id);

        let mut conn = self.client.get_connection();
        let ids: Vec<String> = conn.smembers(&index_key).await?;

        let (tasks, missing) = self.load_many(&ids).await?;

        if !missing.is_empty() {
            tracing::warn!(
                user_id = %user_id,
                count = missing.len(),
                "Task index referenced missing tasks, pruning"
            );
            let _: i64 = conn.srem(&index_key, missing).await?;
        }

        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> RepoResult<()> {
        let fields = task_to_fields(task);
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(keys::task_key(task.id), fields.as_slice())
            .ignore();

        match task.deleted_at {
            Some(deleted_at) => {
                pipe.zadd(DELETED_TASKS_KEY, task.id.to_string(), deleted_at.timestamp())
                    .ignore();
            }
            None => {
                pipe.zrem(DELETED_TASKS_KEY, task.id.to_string()).ignore();
            }
        }

        let mut conn = self.client.get_connection();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, task: &Task) -> RepoResult<bool> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(keys::task_key(task.id))
            .srem(keys::user_tasks_key(task.user_id), task.id.to_string())
            .ignore()
            .zrem(DELETED_TASKS_KEY, task.id.to_string())
            .ignore();

        let mut conn = self.client.get_connection();
        let (removed,): (i64,) = pipe.query_async(&mut conn).await?;

        Ok(removed > 0)
    }

    async fn list_deleted_before(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<Task>> {
        let mut conn = self.client.get_connection();
        let ids: Vec<String> = conn
            .zrangebyscore(DELETED_TASKS_KEY, "-inf", cutoff.timestamp())
            .await?;

        let (tasks, missing) = self.load_many(&ids).await?;

        if !missing.is_empty() {
            let _: i64 = conn.zrem(DELETED_TASKS_KEY, missing).await?;
        }

        Ok(tasks)
    }
}

/// Fixed-window counters stored as expiring `ratelimit:*` strings
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    client: RedisClient,
}

impl RedisRateLimitRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn hit(&self, key: &str, window_secs: u64) -> RepoResult<u64> {
        let mut pipe = redis::pipe();
        // SET NX EX starts the window on the first hit only
        pipe.atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(window_secs)
            .arg("NX")
            .ignore()
            .incr(key, 1u64);

        let mut conn = self.client.get_connection();
        let (count,): (u64,) = pipe.query_async(&mut conn).await?;
        Ok(count)
    }
}
