//! Dataset entity models and DTOs for the catalog.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use datapool_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub url: String,
    pub expected_md5: String,
    pub file_size: Option<i64>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One entry of a `POST /datasets/batch` request body.
#[derive(Debug, Deserialize)]
pub struct BatchEntry {
    pub url: String,
    pub expected_md5: String,
    pub file_size: Option<i64>,
}

/// Outcome of a batch ingest.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub created_count: i64,
    pub skipped_count: i64,
    pub datasets: Vec<Dataset>,
}

/// Query parameters for `GET /datasets`.
#[derive(Debug, Deserialize)]
pub struct DatasetListQuery {
    /// Filter by lowercase status name (e.g. `pending`, `failed`).
    pub status: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Items per page. Defaults to 20, capped at 100.
    pub page_size: Option<i64>,
}

/// One page of datasets plus the unpaged total.
#[derive(Debug, Serialize)]
pub struct DatasetPage {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<Dataset>,
}

/// Backlog counters for `GET /datasets/stats`.
#[derive(Debug, FromRow, Serialize)]
pub struct CatalogStats {
    pub pending_datasets: i64,
    pub downloading_datasets: i64,
    pub completed_datasets: i64,
    pub failed_datasets: i64,
    pub active_tasks: i64,
}
