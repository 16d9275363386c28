/// Expired task sweeper
///
/// Soft-deleted tasks stay restorable for the retention window. Once that
/// window has passed they are purged for good by this sweeper, which calls
/// the task service's cleanup on a fixed interval.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::repository::Repositories;
/// use taskhub_shared::services::TaskService;
/// use taskhub_worker::sweeper::{CleanupSweeper, SweeperConfig};
///
/// # async fn example() {
/// let service = Arc::new(TaskService::new(Repositories::in_memory().tasks));
/// let sweeper = CleanupSweeper::new(service, SweeperConfig::default());
///
/// let token = sweeper.shutdown_token();
/// tokio::spawn(async move { sweeper.run().await });
/// token.cancel();
/// # }
/// ```

use std::sync::Arc;
use taskhub_shared::services::task::TaskService;
use taskhub_shared::services::ServiceResult;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Sweeper configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Seconds between sweeps
    pub interval_secs: u64,

    /// Sweep immediately instead of waiting one interval
    pub run_on_start: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            interval_secs: 3600,
            run_on_start: true,
        }
    }
}

/// Periodic purge of soft-deleted tasks past their retention window
pub struct CleanupSweeper {
    service: Arc<TaskService>,
    config: SweeperConfig,
    shutdown_token: CancellationToken,
}

impl CleanupSweeper {
    pub fn new(service: Arc<TaskService>, config: SweeperConfig) -> Self {
        CleanupSweeper {
            service,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Cancelling it stops `run` after the sweep in progress, if any.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs sweeps until the shutdown token is cancelled
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.config.interval_secs.max(1));
        tracing::info!(
            interval_secs = period.as_secs(),
            retention_days = self.service.retention().num_days(),
            "Cleanup sweeper starting"
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately
        if !self.config.run_on_start {
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Cleanup sweep failed");
                    }
                }
            }
        }

        tracing::info!("Cleanup sweeper shut down");
    }

    /// Executes a single sweep, returning the number of purged tasks
    pub async fn run_once(&self) -> ServiceResult<usize> {
        let purged = self.service.cleanup_expired_tasks().await?;

        if purged > 0 {
            tracing::info!(count = purged, "Purged expired tasks");
        } else {
            tracing::debug!("No expired tasks to purge");
        }

        Ok(purged)
    }
}
