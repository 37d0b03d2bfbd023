//! Route definitions for the `/datasets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::datasets;
use crate::state::AppState;

/// Routes mounted at `/datasets`.
///
/// ```text
/// POST   /batch           -> submit_batch
/// GET    /                -> list_datasets
/// GET    /stats           -> dataset_stats
/// GET    /{id}            -> get_dataset
/// GET    /{id}/tasks      -> list_dataset_tasks
/// POST   /{id}/reset      -> reset_dataset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(datasets::list_datasets))
        .route("/batch", post(datasets::submit_batch))
        .route("/stats", get(datasets::dataset_stats))
        .route("/{id}", get(datasets::get_dataset))
        .route("/{id}/tasks", get(datasets::list_dataset_tasks))
        .route("/{id}/reset", post(datasets::reset_dataset))
}
