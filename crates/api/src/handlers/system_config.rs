//! Handlers for runtime heartbeat configuration.
//!
//! Settings live in the `system_configs` table and are read fresh by every
//! operation that needs them, so an update here takes effect on the next
//! lease grant or sweep without a restart.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use datapool_core::catalog::{CONFIG_HEARTBEAT_INTERVAL, CONFIG_HEARTBEAT_TIMEOUT};
use datapool_core::error::CoreError;
use datapool_db::models::system_config::UpdateHeartbeatConfig;
use datapool_db::repositories::SystemConfigRepo;

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /config/heartbeat
// ---------------------------------------------------------------------------

/// The effective heartbeat settings, fallbacks applied.
pub async fn get_heartbeat_config(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let config = SystemConfigRepo::heartbeat_config(&state.pool).await?;
    Ok(ApiResponse::success(config))
}

// ---------------------------------------------------------------------------
// PUT /config/heartbeat
// ---------------------------------------------------------------------------

/// Update either or both heartbeat settings.
///
/// Values must be positive, and the effective interval must not exceed the
/// effective timeout — otherwise every lease would expire between two
/// scheduled heartbeats.
pub async fn update_heartbeat_config(
    State(state): State<AppState>,
    Json(input): Json<UpdateHeartbeatConfig>,
) -> AppResult<impl IntoResponse> {
    if input.heartbeat_interval_seconds.is_none() && input.heartbeat_timeout_seconds.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one of heartbeat_interval_seconds or heartbeat_timeout_seconds is required"
                .to_string(),
        )));
    }

    for (field, value) in [
        (CONFIG_HEARTBEAT_INTERVAL, input.heartbeat_interval_seconds),
        (CONFIG_HEARTBEAT_TIMEOUT, input.heartbeat_timeout_seconds),
    ] {
        if let Some(value) = value {
            if value <= 0 {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "{field} must be a positive integer, got {value}"
                ))));
            }
        }
    }

    let current = SystemConfigRepo::heartbeat_config(&state.pool).await?;
    let interval = input
        .heartbeat_interval_seconds
        .unwrap_or(current.heartbeat_interval_seconds);
    let timeout = input
        .heartbeat_timeout_seconds
        .unwrap_or(current.heartbeat_timeout_seconds);

    if interval > timeout {
        return Err(AppError::Core(CoreError::Validation(format!(
            "heartbeat_interval_seconds ({interval}) must not exceed \
             heartbeat_timeout_seconds ({timeout})"
        ))));
    }

    if let Some(value) = input.heartbeat_interval_seconds {
        SystemConfigRepo::upsert(&state.pool, CONFIG_HEARTBEAT_INTERVAL, &value.to_string())
            .await?;
    }
    if let Some(value) = input.heartbeat_timeout_seconds {
        SystemConfigRepo::upsert(&state.pool, CONFIG_HEARTBEAT_TIMEOUT, &value.to_string())
            .await?;
    }

    tracing::info!(
        heartbeat_interval_seconds = interval,
        heartbeat_timeout_seconds = timeout,
        "Heartbeat configuration updated",
    );

    let config = SystemConfigRepo::heartbeat_config(&state.pool).await?;
    Ok(ApiResponse::success_with_message(
        config,
        "Heartbeat configuration updated",
    ))
}
