//! # Taskhub Worker
//!
//! Runs the cleanup sweeper against Redis until interrupted.
//!
//! ## Configuration
//!
//! - `REDIS_URL`: Redis connection URL (required)
//! - `CLEANUP_INTERVAL_SECS`: Seconds between sweeps (default: 3600)
//! - `TASK_RETENTION_DAYS`: Days a deleted task stays restorable (default: 7)
//!
//! ## Usage
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379 cargo run -p taskhub-worker
//! ```

use anyhow::Context;
use std::sync::Arc;
use taskhub_shared::redis::{RedisClient, RedisConfig};
use taskhub_shared::repository::Repositories;
use taskhub_shared::services::TaskService;
use taskhub_worker::sweeper::{CleanupSweeper, SweeperConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskhub Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    dotenvy::dotenv().ok();
    let interval_secs: u64 = positive_env("CLEANUP_INTERVAL_SECS", 3600)?;
    let retention_days: i64 = positive_env("TASK_RETENTION_DAYS", 7)?;

    let redis = RedisClient::new(RedisConfig::from_env()?).await?;
    tracing::info!("Connected to Redis");

    let repos = Repositories::redis(redis);
    let service = TaskService::new(repos.tasks)
        .with_retention(chrono::Duration::days(retention_days));

    let sweeper = CleanupSweeper::new(
        Arc::new(service),
        SweeperConfig {
            interval_secs,
            run_on_start: true,
        },
    );

    let shutdown_token = sweeper.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, stopping sweeper..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown_token.cancel();
    });

    sweeper.run().await;

    Ok(())
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_worker=debug,taskhub_shared=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Reads a positive number from the environment, falling back to `default` when unset
fn positive_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number", name))?,
        Err(_) => default,
    };

    if value <= T::default() {
        anyhow::bail!("{} must be greater than zero", name);
    }

    Ok(value)
}
