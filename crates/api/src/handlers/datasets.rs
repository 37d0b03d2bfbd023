//! Handlers for the dataset catalog: bulk ingest, listing, detail, manual
//! reset, per-dataset lease history, and backlog stats.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use datapool_core::catalog;
use datapool_core::error::CoreError;
use datapool_core::pagination::{clamp_page, clamp_page_size};
use datapool_core::types::DbId;
use datapool_db::models::dataset::{
    BatchEntry, BatchResult, Dataset, DatasetListQuery, DatasetPage,
};
use datapool_db::models::status::DatasetStatus;
use datapool_db::repositories::{DatasetRepo, DownloadTaskRepo};

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Verify that a dataset exists, returning the full row.
async fn ensure_dataset_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Dataset> {
    DatasetRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Dataset", id }))
}

// ---------------------------------------------------------------------------
// POST /datasets/batch
// ---------------------------------------------------------------------------

/// Bulk-ingest catalog entries, deduplicating by `(url, expected_md5)`.
///
/// Validation is all-or-nothing: an empty list or any malformed entry
/// rejects the whole batch with no side effects. Responds 201 when every
/// entry was created, 207 when any entry was skipped as a duplicate — even
/// if the whole batch was duplicates.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(entries): Json<Vec<BatchEntry>>,
) -> AppResult<impl IntoResponse> {
    if entries.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Batch must contain at least one entry".to_string(),
        )));
    }

    for (index, entry) in entries.iter().enumerate() {
        catalog::validate_download_url(&entry.url)
            .and_then(|_| catalog::validate_md5(&entry.expected_md5))
            .map_err(|err| {
                AppError::Core(CoreError::Validation(format!("Entry {index}: {err}")))
            })?;
    }

    let normalized: Vec<BatchEntry> = entries
        .into_iter()
        .map(|entry| BatchEntry {
            expected_md5: catalog::normalize_md5(&entry.expected_md5),
            ..entry
        })
        .collect();

    let (datasets, skipped_count) = DatasetRepo::insert_batch(&state.pool, &normalized).await?;
    let created_count = datasets.len() as i64;

    tracing::info!(created_count, skipped_count, "Dataset batch ingested");

    let result = BatchResult {
        created_count,
        skipped_count,
        datasets,
    };

    if skipped_count > 0 {
        Ok(ApiResponse::multi_status(
            result,
            format!("{skipped_count} duplicate entries skipped"),
        ))
    } else {
        Ok(ApiResponse::created(result, "Batch created"))
    }
}

// ---------------------------------------------------------------------------
// GET /datasets
// ---------------------------------------------------------------------------

/// Paginated catalog listing with an optional status filter.
pub async fn list_datasets(
    State(state): State<AppState>,
    Query(params): Query<DatasetListQuery>,
) -> AppResult<impl IntoResponse> {
    let status_id = match params.status.as_deref() {
        None => None,
        Some(name) => Some(
            DatasetStatus::from_name(name)
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(format!(
                        "Unknown dataset status: '{name}'"
                    )))
                })?
                .id(),
        ),
    };

    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size);

    let (items, total) = DatasetRepo::list(&state.pool, status_id, page, page_size).await?;

    Ok(ApiResponse::success(DatasetPage {
        total,
        page,
        page_size,
        items,
    }))
}

// ---------------------------------------------------------------------------
// GET /datasets/stats
// ---------------------------------------------------------------------------

/// Backlog counters: datasets per status plus currently active leases.
pub async fn dataset_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = DatasetRepo::stats(&state.pool).await?;
    Ok(ApiResponse::success(stats))
}

// ---------------------------------------------------------------------------
// GET /datasets/{id}
// ---------------------------------------------------------------------------

/// Get a single dataset by ID.
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dataset = ensure_dataset_exists(&state.pool, id).await?;
    Ok(ApiResponse::success(dataset))
}

// ---------------------------------------------------------------------------
// GET /datasets/{id}/tasks
// ---------------------------------------------------------------------------

/// The lease attempts accumulated by one dataset, newest first.
pub async fn list_dataset_tasks(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_dataset_exists(&state.pool, id).await?;
    let tasks = DownloadTaskRepo::list_by_dataset(&state.pool, id).await?;
    Ok(ApiResponse::success(tasks))
}

// ---------------------------------------------------------------------------
// POST /datasets/{id}/reset
// ---------------------------------------------------------------------------

/// Manually return a dataset to the PENDING backlog.
///
/// Allowed only from PENDING (idempotent no-op) or FAILED. DOWNLOADING and
/// COMPLETED datasets are rejected with 400 and left unchanged.
pub async fn reset_dataset(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dataset = ensure_dataset_exists(&state.pool, id).await?;

    let status = DatasetStatus::from_id(dataset.status_id);
    if !status.is_some_and(DatasetStatus::is_resettable) {
        return Err(AppError::BadRequest(format!(
            "Dataset {id} cannot be reset from status '{}'",
            status.map_or("unknown", DatasetStatus::name),
        )));
    }

    // The repository re-checks the status, so a dataset claimed between the
    // read above and this update is reported, not clobbered.
    let reset = DatasetRepo::reset(&state.pool, id).await?.ok_or_else(|| {
        AppError::BadRequest(format!("Dataset {id} is no longer resettable"))
    })?;

    tracing::info!(dataset_id = id, "Dataset manually reset to pending");

    Ok(ApiResponse::success_with_message(reset, "Dataset reset"))
}
