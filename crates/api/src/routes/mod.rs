//! Route tree for the coordination API.
//!
//! Route hierarchy:
//!
//! ```text
//! /health                      service + database health
//!
//! /datasets/batch              bulk ingest (POST)
//! /datasets                    paginated list (GET)
//! /datasets/stats              backlog counters (GET)
//! /datasets/{id}               detail (GET)
//! /datasets/{id}/tasks         lease history (GET)
//! /datasets/{id}/reset         manual recovery (POST)
//!
//! /tasks/request               acquire lease (POST)
//! /tasks/{id}                  detail (GET)
//! /tasks/{id}/heartbeat        renew lease (POST)
//! /tasks/{id}/complete         close lease (POST)
//!
//! /config/heartbeat            heartbeat settings (GET, PUT)
//! ```

pub mod datasets;
pub mod health;
pub mod system_config;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree (everything except the root-level health check).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/datasets", datasets::router())
        .nest("/tasks", tasks::router())
        .nest("/config", system_config::router())
}
