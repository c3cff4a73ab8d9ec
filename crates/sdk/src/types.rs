//! SDK wire types (mirrors the daemon's RPC payloads)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEntranceResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusResponse {
    /// 1-based waiting position, `0` when allowed, `-1` when not registered.
    pub rank: i64,
    pub allowed: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub user_id: String,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub policy: String,
    pub waiting: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub entrance: QueueStats,
    pub order: QueueStats,
    pub order_capacity: i64,
    pub uptime_seconds: i64,
}
