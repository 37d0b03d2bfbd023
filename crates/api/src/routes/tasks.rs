//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST   /request          -> request_task
/// GET    /{id}             -> get_task
/// POST   /{id}/heartbeat   -> send_heartbeat
/// POST   /{id}/complete    -> complete_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(tasks::request_task))
        .route("/{id}", get(tasks::get_task))
        .route("/{id}/heartbeat", post(tasks::send_heartbeat))
        .route("/{id}/complete", post(tasks::complete_task))
}
