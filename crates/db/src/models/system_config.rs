//! Key/value system configuration rows and the heartbeat settings DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use datapool_core::types::Timestamp;

/// A row from the `system_configs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemConfig {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: Timestamp,
}

/// Effective heartbeat settings with fallbacks applied.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeartbeatConfig {
    pub heartbeat_interval_seconds: i64,
    pub heartbeat_timeout_seconds: i64,
}

/// Request body for `PUT /config/heartbeat`. Absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateHeartbeatConfig {
    pub heartbeat_interval_seconds: Option<i64>,
    pub heartbeat_timeout_seconds: Option<i64>,
}
