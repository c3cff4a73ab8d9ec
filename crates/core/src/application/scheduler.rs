//! Background schedulers driving promotion and eviction ticks
//!
//! Both loops are fixed-delay: the next tick is scheduled only after the
//! previous tick's work completes, so at most one tick per queue instance is
//! ever in flight from this process. Store failures are logged and the tick
//! skipped; the loop retries on the next interval instead of crashing.

use crate::application::queue::AdmissionQueue;
use crate::application::shutdown::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Fixed-delay timer that invokes `promote` on one queue instance.
pub struct PromotionScheduler {
    queue: Arc<AdmissionQueue>,
    interval: Duration,
}

impl PromotionScheduler {
    pub fn new(queue: Arc<AdmissionQueue>, interval: Duration) -> Self {
        Self { queue, interval }
    }

    /// Run the promotion loop until shutdown. Should be spawned in
    /// tokio::spawn.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            queue = %self.queue.name(),
            policy = %self.queue.policy(),
            interval_ms = self.interval.as_millis() as u64,
            "Promotion scheduler started"
        );

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            match self.queue.promote().await {
                Ok(promoted) => {
                    if !promoted.is_empty() {
                        debug!(
                            queue = %self.queue.name(),
                            promoted = promoted.len(),
                            "Promoted waiting members"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        queue = %self.queue.name(),
                        error = %e,
                        "Promotion tick failed, skipping until next interval"
                    );
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {},
                _ = shutdown.wait() => break,
            }
        }

        info!(queue = %self.queue.name(), "Promotion scheduler stopped");
    }
}

/// Fixed-delay timer that sweeps stale leases from one queue's active set.
///
/// Wired only to the capacity-bounded queue; a rate queue has no occupancy to
/// protect. Runs independently of (and concurrently with) the promotion loop.
pub struct EvictionScheduler {
    queue: Arc<AdmissionQueue>,
    interval: Duration,
    lease_timeout_ms: i64,
}

impl EvictionScheduler {
    pub fn new(queue: Arc<AdmissionQueue>, interval: Duration, lease_timeout_ms: i64) -> Self {
        Self {
            queue,
            interval,
            lease_timeout_ms,
        }
    }

    /// Run the eviction loop until shutdown. Should be spawned in
    /// tokio::spawn.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            queue = %self.queue.name(),
            interval_ms = self.interval.as_millis() as u64,
            lease_timeout_ms = self.lease_timeout_ms,
            "Eviction scheduler started"
        );

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            match self.queue.evict_stale(self.lease_timeout_ms).await {
                Ok(evicted) => {
                    if evicted > 0 {
                        debug!(
                            queue = %self.queue.name(),
                            evicted,
                            "Swept stale leases"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        queue = %self.queue.name(),
                        error = %e,
                        "Eviction tick failed, skipping until next interval"
                    );
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {},
                _ = shutdown.wait() => break,
            }
        }

        info!(queue = %self.queue.name(), "Eviction scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::PromotionPolicy;
    use crate::port::member_store::memory::MemoryMemberStore;
    use crate::port::member_store::testing::FlakyMemberStore;
    use crate::port::time_provider::SystemTimeProvider;

    fn make_queue(policy: PromotionPolicy) -> Arc<AdmissionQueue> {
        Arc::new(AdmissionQueue::new(
            "sched_test",
            policy,
            Arc::new(MemoryMemberStore::new()),
            Arc::new(MemoryMemberStore::new()),
            Arc::new(SystemTimeProvider),
        ))
    }

    #[tokio::test]
    async fn test_promotion_scheduler_drains_wait_set() {
        let queue = make_queue(PromotionPolicy::rate(2).unwrap());
        for token in ["A", "B", "C"] {
            queue.register(token).await.unwrap();
        }

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let scheduler = PromotionScheduler::new(queue.clone(), Duration::from_millis(10));
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        // Two ticks at batch 2 admit all three
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.shutdown();
        handle.await.unwrap();

        let (waiting, active) = queue.counts().await.unwrap();
        assert_eq!((waiting, active), (0, 3));
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let queue = make_queue(PromotionPolicy::capacity(1).unwrap());
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let scheduler = PromotionScheduler::new(queue, Duration::from_secs(3600));
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        shutdown_tx.shutdown();
        // Must return promptly despite the hour-long interval
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_promotion_scheduler_survives_store_outage() {
        let wait = Arc::new(FlakyMemberStore::new());
        let queue = Arc::new(AdmissionQueue::new(
            "sched_test",
            PromotionPolicy::rate(10).unwrap(),
            wait.clone(),
            Arc::new(MemoryMemberStore::new()),
            Arc::new(SystemTimeProvider),
        ));
        queue.register("A").await.unwrap();

        // The next two ticks hit a store outage; the loop must log, skip and
        // keep running rather than exit
        wait.fail_next(2);

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let scheduler = PromotionScheduler::new(queue.clone(), Duration::from_millis(10));
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.shutdown();
        handle.await.unwrap();

        // Promotion succeeded once the store recovered
        let (waiting, active) = queue.counts().await.unwrap();
        assert_eq!((waiting, active), (0, 1));
    }

    #[tokio::test]
    async fn test_eviction_scheduler_sweeps_expired_leases() {
        let queue = make_queue(PromotionPolicy::capacity(5).unwrap());
        queue.register("A").await.unwrap();
        queue.promote().await.unwrap();

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        // Zero-millisecond lease expires the entry on the first sweep
        let scheduler = EvictionScheduler::new(queue.clone(), Duration::from_millis(10), 0);
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.shutdown();
        handle.await.unwrap();

        let (_, active) = queue.counts().await.unwrap();
        assert_eq!(active, 0);
    }
}
