//! Repository for the `system_configs` key/value table.
//!
//! Values are read fresh on every operation that needs them — there is no
//! process-wide cache — so an upsert takes effect on the next request
//! without a restart, including for other instances sharing the database.

use sqlx::PgPool;

use datapool_core::catalog::{
    CONFIG_HEARTBEAT_INTERVAL, CONFIG_HEARTBEAT_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL_SECS,
    DEFAULT_HEARTBEAT_TIMEOUT_SECS,
};

use crate::models::system_config::{HeartbeatConfig, SystemConfig};

/// Column list for `system_configs` queries.
const COLUMNS: &str = "key, value, description, updated_at";

/// Provides live lookups and upserts for system configuration.
pub struct SystemConfigRepo;

impl SystemConfigRepo {
    /// Fetch a raw config row by key.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<SystemConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM system_configs WHERE key = $1");
        sqlx::query_as::<_, SystemConfig>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Read an integer config value, falling back to `default` when the row
    /// is absent or its value does not parse as a positive integer.
    pub async fn get_int(pool: &PgPool, key: &str, default: i64) -> Result<i64, sqlx::Error> {
        let row = Self::get(pool, key).await?;
        Ok(row
            .and_then(|config| config.value.parse::<i64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(default))
    }

    /// Upsert a config value, returning the stored row.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &str,
    ) -> Result<SystemConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO system_configs (key, value) \
             VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SystemConfig>(&query)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Effective heartbeat settings with hard-coded fallbacks applied.
    pub async fn heartbeat_config(pool: &PgPool) -> Result<HeartbeatConfig, sqlx::Error> {
        let heartbeat_interval_seconds = Self::get_int(
            pool,
            CONFIG_HEARTBEAT_INTERVAL,
            DEFAULT_HEARTBEAT_INTERVAL_SECS,
        )
        .await?;
        let heartbeat_timeout_seconds = Self::get_int(
            pool,
            CONFIG_HEARTBEAT_TIMEOUT,
            DEFAULT_HEARTBEAT_TIMEOUT_SECS,
        )
        .await?;
        Ok(HeartbeatConfig {
            heartbeat_interval_seconds,
            heartbeat_timeout_seconds,
        })
    }
}
