//! AdmissionQueue - one wait set + one active set under a promotion policy
//!
//! Per-token state machine: UNREGISTERED -> WAITING -> ACTIVE -> (released |
//! evicted). The terminal states are not stored; absence from both sets means
//! the token is out of the queue.

use crate::domain::{PromotionPolicy, QueueStatus, Token};
use crate::error::Result;
use crate::port::{OrderedMemberStore, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Admission queue over a wait/active store pair.
///
/// The wait set is scored by enqueue time (ascending score = promotion order);
/// the active set is scored by last-seen heartbeat time and acts as a lease on
/// the capacity-bounded queue.
pub struct AdmissionQueue {
    name: String,
    policy: PromotionPolicy,
    wait: Arc<dyn OrderedMemberStore>,
    active: Arc<dyn OrderedMemberStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AdmissionQueue {
    pub fn new(
        name: impl Into<String>,
        policy: PromotionPolicy,
        wait: Arc<dyn OrderedMemberStore>,
        active: Arc<dyn OrderedMemberStore>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            wait,
            active,
            time_provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> PromotionPolicy {
        self.policy
    }

    /// Enqueue a token into the wait set.
    ///
    /// Idempotent: a token already in either set keeps its current position
    /// and lease untouched. Fails only on store unavailability.
    pub async fn register(&self, token: &str) -> Result<()> {
        if self.active.rank(token).await?.is_some() || self.wait.rank(token).await?.is_some() {
            debug!(queue = %self.name, token = %token, "Already registered, no-op");
            return Ok(());
        }
        let now = self.time_provider.now_millis();
        self.wait.upsert(token, now).await?;
        debug!(queue = %self.name, token = %token, enqueued_at = now, "Registered");
        Ok(())
    }

    /// Report the token's position, renewing its lease if active.
    ///
    /// The heartbeat touch on an active token deliberately couples "read
    /// status" with "renew lease": as long as an admitted caller keeps
    /// polling, its slot is not evicted. The rank-check/touch pair is two
    /// store round trips and races with `evict_stale`; losing that race only
    /// grants one extra lease interval to an about-to-be-evicted member.
    pub async fn status(&self, token: &str) -> Result<QueueStatus> {
        let status = if self.active.rank(token).await?.is_some() {
            let now = self.time_provider.now_millis();
            self.active.upsert(token, now).await?;
            QueueStatus::active()
        } else if let Some(rank) = self.wait.rank(token).await? {
            // 0-based store rank -> 1-based user-facing position
            QueueStatus::waiting(rank + 1)
        } else {
            QueueStatus::not_registered()
        };
        debug!(
            queue = %self.name,
            token = %token,
            state = %status.state(),
            rank = status.rank,
            "Status"
        );
        Ok(status)
    }

    /// Remove the token from both sets.
    ///
    /// Idempotent; used when the caller has finished the protected action and
    /// voluntarily frees its slot.
    pub async fn release(&self, token: &str) -> Result<()> {
        let tokens = [token.to_string()];
        self.active.remove(&tokens).await?;
        self.wait.remove(&tokens).await?;
        debug!(queue = %self.name, token = %token, "Released");
        Ok(())
    }

    /// Move the earliest waiting members to the active set per the queue's
    /// policy. Invoked only by the promotion scheduler.
    ///
    /// Each move is remove-from-wait then add-to-active, so a token is never
    /// visible in both sets at once; a concurrent `status` may observe the
    /// transient absence as not-registered for one poll.
    pub async fn promote(&self) -> Result<Vec<Token>> {
        let quota = match self.policy {
            PromotionPolicy::Rate { batch_size } => batch_size,
            PromotionPolicy::Capacity { max_capacity } => {
                max_capacity - self.active.count().await?
            }
        };
        if quota <= 0 {
            return Ok(Vec::new());
        }

        let batch = self.wait.range_ascending(0, quota - 1).await?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.time_provider.now_millis();
        for token in &batch {
            self.wait.remove(std::slice::from_ref(token)).await?;
            self.active.upsert(token, now).await?;
        }

        info!(
            queue = %self.name,
            policy = %self.policy,
            promoted = batch.len(),
            "Promotion tick"
        );
        Ok(batch)
    }

    /// Evict active members whose heartbeat is older than `timeout_ms`.
    ///
    /// Only meaningful on the capacity-bounded queue; this and explicit
    /// `release` are the sole mechanisms that free capacity slots.
    pub async fn evict_stale(&self, timeout_ms: i64) -> Result<i64> {
        let cutoff = self.time_provider.now_millis() - timeout_ms;
        let evicted = self.active.remove_range_by_score(0, cutoff).await?;
        if evicted > 0 {
            info!(queue = %self.name, evicted, cutoff, "Evicted stale leases");
        }
        Ok(evicted)
    }

    /// `(waiting, active)` member counts for stats and overshoot monitoring.
    pub async fn counts(&self) -> Result<(i64, i64)> {
        Ok((self.wait.count().await?, self.active.count().await?))
    }
}
