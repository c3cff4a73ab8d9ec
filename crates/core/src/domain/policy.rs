// Promotion Policy Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Policy controlling how waiting members are promoted each scheduler tick.
///
/// Selected per queue instance at construction, not per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionPolicy {
    /// Admit a fixed number of waiting members per tick regardless of current
    /// occupancy. "Active" here is a one-shot admission marker, not a
    /// resource reservation. Used for the entrance gate.
    Rate { batch_size: i64 },

    /// Admit only as many waiting members as there are free slots under a
    /// fixed occupancy cap. Slots are freed by explicit release or by
    /// heartbeat-timeout eviction. Used for the order-submission gate.
    Capacity { max_capacity: i64 },
}

impl PromotionPolicy {
    pub fn rate(batch_size: i64) -> Result<Self> {
        if batch_size <= 0 {
            return Err(DomainError::InvalidBatchSize(batch_size));
        }
        Ok(Self::Rate { batch_size })
    }

    pub fn capacity(max_capacity: i64) -> Result<Self> {
        if max_capacity <= 0 {
            return Err(DomainError::InvalidCapacity(max_capacity));
        }
        Ok(Self::Capacity { max_capacity })
    }

    /// Whether active entries carry a lease that expires without heartbeats.
    ///
    /// Only capacity-bounded occupancy needs the eviction sweep; a rate queue
    /// has nothing to protect.
    pub fn has_bounded_occupancy(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }
}

impl std::fmt::Display for PromotionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rate { batch_size } => write!(f, "RATE({})", batch_size),
            Self::Capacity { max_capacity } => write!(f, "CAPACITY({})", max_capacity),
        }
    }
}
