//! Handlers for download leases: acquisition, heartbeat, completion, and
//! detail.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use datapool_core::catalog;
use datapool_core::error::CoreError;
use datapool_core::types::DbId;
use datapool_db::models::download_task::{
    CompleteRequest, CompletionResult, DownloadTask, HeartbeatAck, HeartbeatRequest,
    RequestTask, TaskAssignment,
};
use datapool_db::models::status::{DatasetStatus, TaskStatus};
use datapool_db::repositories::{DatasetRepo, DownloadTaskRepo, SystemConfigRepo};

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract a non-blank `client_id`, rejecting its absence up front.
fn require_client_id(client_id: Option<&str>) -> AppResult<&str> {
    match client_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AppError::Core(CoreError::Validation(
            "client_id is required".to_string(),
        ))),
    }
}

/// Verify that a task exists, returning the full row.
async fn ensure_task_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<DownloadTask> {
    DownloadTaskRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "DownloadTask",
                id,
            })
        })
}

/// Ownership and liveness preconditions shared by heartbeat and complete.
///
/// The task must be ACTIVE and owned by `client_id`; both violations are
/// business-rule rejections, not not-found.
fn check_task_claim(task: &DownloadTask, client_id: &str) -> AppResult<()> {
    if task.client_id != client_id {
        return Err(AppError::BadRequest(format!(
            "Task {} is not owned by client '{client_id}'",
            task.id,
        )));
    }
    if task.status_id != TaskStatus::Active.id() {
        return Err(AppError::BadRequest(format!(
            "Task {} is not active",
            task.id,
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /tasks/request
// ---------------------------------------------------------------------------

/// Acquire an exclusive download lease on the oldest pending dataset.
///
/// Responds 200 with `data = null` when the backlog is empty; absence of
/// work is not an error. A granted lease carries the dataset payload and
/// the heartbeat settings the worker must honor, read fresh from system
/// config.
pub async fn request_task(
    State(state): State<AppState>,
    Json(input): Json<RequestTask>,
) -> AppResult<impl IntoResponse> {
    let client_id = require_client_id(input.client_id.as_deref())?;

    let heartbeat = SystemConfigRepo::heartbeat_config(&state.pool).await?;

    let Some((task, dataset)) = DownloadTaskRepo::claim_next(&state.pool, client_id).await?
    else {
        return Ok(ApiResponse::none("No pending dataset available"));
    };

    tracing::info!(
        task_id = task.id,
        dataset_id = dataset.id,
        client_id = %client_id,
        "Download lease granted",
    );

    Ok(ApiResponse::success(TaskAssignment {
        task_id: task.id,
        dataset,
        heartbeat_interval_seconds: heartbeat.heartbeat_interval_seconds,
        heartbeat_timeout_seconds: heartbeat.heartbeat_timeout_seconds,
    }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/heartbeat
// ---------------------------------------------------------------------------

/// Renew a lease by touching its heartbeat timestamp.
pub async fn send_heartbeat(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<HeartbeatRequest>,
) -> AppResult<impl IntoResponse> {
    let client_id = require_client_id(input.client_id.as_deref())?;

    let updated = DownloadTaskRepo::heartbeat(&state.pool, id, client_id).await?;

    let Some(task) = updated else {
        // Zero rows matched: distinguish unknown task from ownership or
        // liveness violations for the error response.
        let task = ensure_task_exists(&state.pool, id).await?;
        check_task_claim(&task, client_id)?;
        return Err(AppError::InternalError(format!(
            "Heartbeat for task {id} matched no rows",
        )));
    };

    tracing::debug!(task_id = id, client_id = %client_id, "Heartbeat accepted");

    Ok(ApiResponse::success(HeartbeatAck {
        task_id: task.id,
        last_heartbeat: task.last_heartbeat,
    }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/complete
// ---------------------------------------------------------------------------

/// Close a lease with checksum verification.
///
/// The reported digest is compared case-insensitively against the dataset's
/// expected MD5. A mismatch fails both the task and the dataset but is
/// still HTTP 200: the request itself succeeded, the verification did not.
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteRequest>,
) -> AppResult<impl IntoResponse> {
    let client_id = require_client_id(input.client_id.as_deref())?;

    let actual_md5 = input.actual_md5.as_deref().unwrap_or_default();
    catalog::validate_md5(actual_md5).map_err(AppError::Core)?;
    let actual_md5 = catalog::normalize_md5(actual_md5);

    let task = ensure_task_exists(&state.pool, id).await?;
    check_task_claim(&task, client_id)?;

    let dataset = DatasetRepo::find_by_id(&state.pool, task.dataset_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id: task.dataset_id,
        }))?;

    let verified = catalog::md5_matches(&dataset.expected_md5, &actual_md5);

    let closed = if verified {
        DownloadTaskRepo::complete(&state.pool, id, &actual_md5, input.storage_path.as_deref())
            .await?
    } else {
        DownloadTaskRepo::fail(&state.pool, id, &actual_md5, "MD5 mismatch").await?
    };

    // A concurrent timeout sweep may have reclaimed the lease between the
    // precondition read and the CAS update; first committer wins.
    let closed = closed.ok_or_else(|| {
        AppError::BadRequest(format!("Task {id} is no longer active"))
    })?;

    let (task_status, dataset_status) = if verified {
        tracing::info!(
            task_id = id,
            dataset_id = dataset.id,
            client_id = %client_id,
            "Download completed and verified",
        );
        (TaskStatus::Completed, DatasetStatus::Completed)
    } else {
        tracing::warn!(
            task_id = id,
            dataset_id = dataset.id,
            client_id = %client_id,
            expected_md5 = %dataset.expected_md5,
            actual_md5 = %actual_md5,
            "Checksum mismatch on completion",
        );
        (TaskStatus::Failed, DatasetStatus::Failed)
    };

    Ok(ApiResponse::success(CompletionResult {
        task_id: id,
        task_status: task_status.name(),
        dataset_status: dataset_status.name(),
        storage_path: closed.storage_path,
    }))
}

// ---------------------------------------------------------------------------
// GET /tasks/{id}
// ---------------------------------------------------------------------------

/// Get a single task by ID.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    Ok(ApiResponse::success(task))
}
