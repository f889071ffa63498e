use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::ratelimit::RateLimiter;

/// Background task that evicts idle rate limit buckets
pub struct RateLimitCleanupTask {
    limiter: Arc<RateLimiter>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl RateLimitCleanupTask {
    pub fn new(limiter: Arc<RateLimiter>, shutdown: broadcast::Receiver<()>) -> Self {
        let interval = Duration::from_secs(limiter.config().cleanup_interval_seconds.max(1));
        Self {
            limiter,
            interval,
            shutdown,
        }
    }

    /// Run until the shutdown signal fires
    pub async fn run(mut self) {
        let mut cleanup_timer = tokio::time::interval(self.interval);

        // Skip immediate first tick
        cleanup_timer.tick().await;

        tracing::info!(
            cleanup_interval_secs = self.interval.as_secs(),
            bucket_ttl_secs = self.limiter.config().bucket_ttl_seconds,
            "Rate limit cleanup task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Rate limit cleanup task received shutdown signal");
                    break;
                }
                _ = cleanup_timer.tick() => {
                    self.limiter.cleanup_stale();
                }
            }
        }

        tracing::info!("Rate limit cleanup task stopped");
    }
}
