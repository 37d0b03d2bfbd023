//! Route definitions for the `/config` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::system_config;
use crate::state::AppState;

/// Routes mounted at `/config`.
///
/// ```text
/// GET    /heartbeat   -> get_heartbeat_config
/// PUT    /heartbeat   -> update_heartbeat_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/heartbeat",
        get(system_config::get_heartbeat_config).put(system_config::update_heartbeat_config),
    )
}
