//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};
use turnstile_core::domain::QueueStatus;

/// entrance.register.v1 - Register for the entrance queue
///
/// Anonymous callers omit `user_id` and receive a minted token they must echo
/// back on every later call.
#[derive(Debug, Deserialize)]
pub struct RegisterEntranceRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterEntranceResponse {
    pub token: String,
}

/// entrance.status.v1 - Poll entrance queue position
#[derive(Debug, Deserialize)]
pub struct EntranceStatusRequest {
    pub token: String,
}

/// order.register.v1 - Register for the order queue (authenticated id)
#[derive(Debug, Deserialize)]
pub struct RegisterOrderRequest {
    pub user_id: String,
}

/// order.status.v1 - Poll order queue position (renews the lease when active)
#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub user_id: String,
}

/// order.release.v1 - Free the order slot after the protected action finishes
#[derive(Debug, Deserialize)]
pub struct ReleaseOrderRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub user_id: String,
    pub acknowledged: bool,
}

/// Client-facing queue status payload
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusResponse {
    pub rank: i64,
    pub allowed: bool,
    pub message: String,
}

impl From<QueueStatus> for QueueStatusResponse {
    fn from(status: QueueStatus) -> Self {
        Self {
            rank: status.rank,
            allowed: status.allowed,
            message: status.message,
        }
    }
}

/// admin.stats.v1 - Per-queue occupancy statistics
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub policy: String,
    pub waiting: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub entrance: QueueStats,
    pub order: QueueStats,
    /// Configured order capacity; compare against `order.active` to observe
    /// soft overshoot.
    pub order_capacity: i64,
    pub uptime_seconds: i64,
}
