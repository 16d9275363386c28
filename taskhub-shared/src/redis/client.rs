/// Redis connection handle
///
/// One `RedisClient` is built in `main` and cloned into every repository.
/// It owns a `redis::aio::ConnectionManager`, which multiplexes commands over
/// a single connection and reconnects by itself when Redis restarts.
/// Connections handed out by [`RedisClient::get_connection`] fail any command
/// or pipeline that takes longer than `command_timeout_secs`.
///
/// Startup retries the first connection `max_retries` times with a linear
/// backoff, so the API and worker can be started alongside a Redis container
/// that is still booting.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let stats = client.stats().await;
/// println!("reachable: {} ({:?} ms)", stats.healthy, stats.latency_ms);
/// # Ok(())
/// # }
/// ```

use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{Client, Cmd, Pipeline, RedisError, RedisFuture, Value};
use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while setting up or probing the connection
#[derive(Error, Debug)]
pub enum RedisClientError {
    /// REDIS_URL or a tuning variable is missing or malformed
    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    /// Every connection attempt failed
    #[error("could not connect to Redis at {url} after {attempts} attempt(s): {reason}")]
    ConnectionError {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// A command did not answer within the command timeout
    #[error("Redis command timed out after {0}s")]
    Timeout(u64),

    /// A command answered with an error
    #[error("Redis command error: {0}")]
    CommandError(#[from] redis::RedisError),
}

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// `redis://[username:password@]host:port[/db]`
    pub url: String,

    /// Budget for each connection attempt
    pub connection_timeout_secs: u64,

    /// Budget for every command or pipeline, health checks included
    pub command_timeout_secs: u64,

    /// Extra connection attempts after the first one fails
    pub max_retries: u32,
}

impl RedisConfig {
    /// Loads settings from the environment
    ///
    /// - `REDIS_URL` (required)
    /// - `REDIS_CONNECTION_TIMEOUT_SECS` (default 5)
    /// - `REDIS_COMMAND_TIMEOUT_SECS` (default 10)
    /// - `REDIS_MAX_RETRIES` (default 3)
    pub fn from_env() -> Result<Self, RedisClientError> {
        dotenvy::dotenv().ok();

        let url = env::var("REDIS_URL").map_err(|_| {
            RedisClientError::ConfigError("REDIS_URL environment variable is required".to_string())
        })?;

        Ok(Self {
            url,
            connection_timeout_secs: parse_var("REDIS_CONNECTION_TIMEOUT_SECS", 5)?,
            command_timeout_secs: parse_var("REDIS_COMMAND_TIMEOUT_SECS", 10)?,
            max_retries: parse_var("REDIS_MAX_RETRIES", 3)?,
        })
    }

    /// A Redis on localhost with default tuning
    pub fn local() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout_secs: 5,
            command_timeout_secs: 10,
            max_retries: 3,
        }
    }

    /// The URL with any credentials masked, safe to log
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };

        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => self.url.clone(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, RedisClientError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RedisClientError::ConfigError(format!("{} must be a number", name))),
        Err(_) => Ok(default),
    }
}

/// Shared handle to the store; cloning shares the connection
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects, retrying with a linear backoff
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("invalid REDIS_URL: {}", e)))?;

        let attempts = config.max_retries.saturating_add(1);
        let mut reason = String::new();

        for attempt in 1..=attempts {
            match connect_once(&client, config.connection_timeout_secs).await {
                Ok(manager) => {
                    tracing::info!(url = %config.redacted_url(), attempt, "Connected to Redis");
                    return Ok(Self {
                        manager,
                        config: Arc::new(config),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        url = %config.redacted_url(),
                        attempt,
                        error = %e,
                        "Redis connection attempt failed"
                    );
                    reason = e;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
            }
        }

        Err(RedisClientError::ConnectionError {
            url: config.redacted_url(),
            attempts,
            reason,
        })
    }

    /// Sends PING; `Ok(false)` means Redis answered with something other than PONG
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.get_connection();

        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RedisClientError::Timeout(self.config.command_timeout_secs)
                } else {
                    RedisClientError::CommandError(e)
                }
            })?;

        Ok(reply == "PONG")
    }

    /// Connection handle for issuing commands, bounded by the command timeout
    pub fn get_connection(&self) -> TimedConnection {
        TimedConnection::new(
            self.manager.clone(),
            Duration::from_secs(self.config.command_timeout_secs),
        )
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Probes the store once, for health reporting
    pub async fn stats(&self) -> RedisStats {
        let started = Instant::now();

        match self.ping().await {
            Ok(healthy) => RedisStats {
                healthy,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                url: self.config.redacted_url(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Redis health probe failed");
                RedisStats {
                    healthy: false,
                    latency_ms: None,
                    url: self.config.redacted_url(),
                }
            }
        }
    }
}

async fn connect_once(client: &Client, timeout_secs: u64) -> Result<ConnectionManager, String> {
    match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        ConnectionManager::new(client.clone()),
    )
    .await
    {
        Ok(Ok(manager)) => Ok(manager),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", timeout_secs)),
    }
}

/// A connection whose commands give up after a fixed budget
///
/// A command that runs out of time fails with an I/O `TimedOut` error, so
/// `RedisError::is_timeout` holds for it.
#[derive(Clone)]
pub struct TimedConnection<C = ConnectionManager> {
    inner: C,
    timeout: Duration,
}

impl<C> TimedConnection<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

fn timed_out(budget: Duration) -> RedisError {
    RedisError::from(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("Redis command timed out after {}s", budget.as_secs()),
    ))
}

impl<C: ConnectionLike + Send> ConnectionLike for TimedConnection<C> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        let budget = self.timeout;
        Box::pin(async move {
            tokio::time::timeout(budget, self.inner.req_packed_command(cmd))
                .await
                .map_err(|_| timed_out(budget))?
        })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        pipeline: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        let budget = self.timeout;
        Box::pin(async move {
            tokio::time::timeout(budget, self.inner.req_packed_commands(pipeline, offset, count))
                .await
                .map_err(|_| timed_out(budget))?
        })
    }

    fn get_db(&self) -> i64 {
        self.inner.get_db()
    }
}

/// Result of a health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStats {
    /// Redis answered PONG
    pub healthy: bool,

    /// Round trip of the probe, when it answered
    pub latency_ms: Option<u64>,

    /// Redacted connection URL
    pub url: String,
}
