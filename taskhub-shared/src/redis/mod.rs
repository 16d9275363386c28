/// Redis integration
///
/// Redis holds all persisted state: users, sessions, tasks and the per-user
/// task index. This module provides the connection wrapper and the key
/// naming scheme; record encoding lives with the repositories.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// println!("Redis healthy: {}", client.ping().await?);
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod keys;

pub use client::{RedisClient, RedisClientError, RedisConfig, RedisStats};
