//! Download lease (task) entity models and DTOs.
//!
//! A `DownloadTask` is one worker's exclusive, time-bounded claim on a
//! dataset. Tasks are an append-only audit trail; a dataset may accumulate
//! many over its life, but at most one is ACTIVE at any time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use datapool_core::types::{DbId, Timestamp};

use super::dataset::Dataset;
use super::status::StatusId;

/// A row from the `download_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DownloadTask {
    pub id: DbId,
    pub dataset_id: DbId,
    pub client_id: String,
    pub status_id: StatusId,
    pub last_heartbeat: Option<Timestamp>,
    pub actual_md5: Option<String>,
    pub storage_path: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Request body for `POST /tasks/request`.
#[derive(Debug, Deserialize)]
pub struct RequestTask {
    pub client_id: Option<String>,
}

/// Response payload for a granted lease.
#[derive(Debug, Serialize)]
pub struct TaskAssignment {
    pub task_id: DbId,
    pub dataset: Dataset,
    pub heartbeat_interval_seconds: i64,
    pub heartbeat_timeout_seconds: i64,
}

/// Request body for `POST /tasks/{id}/heartbeat`.
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub client_id: Option<String>,
}

/// Response payload for an accepted heartbeat.
#[derive(Debug, Serialize)]
pub struct HeartbeatAck {
    pub task_id: DbId,
    pub last_heartbeat: Option<Timestamp>,
}

/// Request body for `POST /tasks/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub client_id: Option<String>,
    pub actual_md5: Option<String>,
    pub storage_path: Option<String>,
}

/// Response payload for a lease closure (verified or failed).
#[derive(Debug, Serialize)]
pub struct CompletionResult {
    pub task_id: DbId,
    pub task_status: &'static str,
    pub dataset_status: &'static str,
    pub storage_path: Option<String>,
}

/// One reclaimed lease in a timeout sweep report.
///
/// `timeout_seconds` is filled in by the repository from the value the
/// sweep ran with; the remaining fields come from the row join.
#[derive(Debug, FromRow, Serialize)]
pub struct ReclaimedLease {
    pub task_id: DbId,
    pub dataset_id: DbId,
    pub dataset_url: String,
    pub client_id: String,
    pub last_heartbeat: Timestamp,
    #[sqlx(default)]
    pub timeout_seconds: i64,
}
