//! Periodic reclamation of abandoned download leases.
//!
//! Spawns a background loop that reads the heartbeat timeout fresh from
//! system config on every pass, reclaims ACTIVE tasks whose heartbeat has
//! gone stale, and returns their datasets to the PENDING backlog. The sweep
//! interval must stay materially smaller than the heartbeat timeout so
//! reclamation staleness stays bounded.
//!
//! Reclamation is self-healing and never surfaces as an error to any
//! worker; the sweep only logs what it recycled.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use datapool_core::catalog::{CONFIG_HEARTBEAT_TIMEOUT, DEFAULT_HEARTBEAT_TIMEOUT_SECS};
use datapool_db::repositories::{DownloadTaskRepo, SystemConfigRepo};

/// Run the lease sweep loop until `cancel` is triggered.
pub async fn run(pool: PgPool, sweep_interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = sweep_interval.as_secs(),
        "Lease sweeper started"
    );

    let mut interval = tokio::time::interval(sweep_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lease sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = sweep_once(&pool).await {
                    tracing::error!(error = %e, "Lease sweep failed");
                }
            }
        }
    }
}

/// One sweep pass: read the live timeout, reclaim stale leases.
async fn sweep_once(pool: &PgPool) -> Result<(), sqlx::Error> {
    let timeout_seconds = SystemConfigRepo::get_int(
        pool,
        CONFIG_HEARTBEAT_TIMEOUT,
        DEFAULT_HEARTBEAT_TIMEOUT_SECS,
    )
    .await?;

    let reclaimed = DownloadTaskRepo::sweep_timed_out(pool, timeout_seconds).await?;

    if reclaimed.is_empty() {
        tracing::debug!("Lease sweep: nothing to reclaim");
        return Ok(());
    }

    for lease in &reclaimed {
        tracing::warn!(
            task_id = lease.task_id,
            dataset_id = lease.dataset_id,
            client_id = %lease.client_id,
            last_heartbeat = %lease.last_heartbeat,
            timeout_seconds,
            "Lease timed out, dataset returned to backlog",
        );
    }
    tracing::info!(reclaimed = reclaimed.len(), "Lease sweep reclaimed stale leases");

    Ok(())
}
