//! Repository for the `download_tasks` table.
//!
//! Owns the three race-sensitive lease operations: FIFO claim, heartbeat,
//! and closure (plus the timeout sweep). Claim and sweep use
//! `FOR UPDATE SKIP LOCKED` so concurrent callers pass over rows another
//! transaction is working on; every status flip carries a status predicate
//! in its `WHERE` clause, so the losing side of a race affects zero rows
//! and no-ops.

use sqlx::PgPool;

use datapool_core::types::DbId;

use crate::models::dataset::Dataset;
use crate::models::download_task::{DownloadTask, ReclaimedLease};
use crate::models::status::{DatasetStatus, TaskStatus};

/// Column list for `download_tasks` queries.
const COLUMNS: &str = "\
    id, dataset_id, client_id, status_id, last_heartbeat, \
    actual_md5, storage_path, error_message, completed_at, created_at";

/// Column list for `datasets` rows returned alongside a claim.
const DATASET_COLUMNS: &str = "\
    id, url, expected_md5, file_size, status_id, created_at, updated_at";

/// Provides lease operations for download tasks.
pub struct DownloadTaskRepo;

impl DownloadTaskRepo {
    /// Atomically claim the oldest PENDING dataset for a worker.
    ///
    /// FIFO by dataset creation time. The `FOR UPDATE SKIP LOCKED` select
    /// makes concurrent claimants pass over the row this transaction is
    /// flipping, so no two workers ever receive the same dataset. Returns
    /// the new ACTIVE task (with `last_heartbeat` set to now) and the
    /// dataset in its DOWNLOADING state, or `None` when the backlog is
    /// empty.
    pub async fn claim_next(
        pool: &PgPool,
        client_id: &str,
    ) -> Result<Option<(DownloadTask, Dataset)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select_query = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets \
             WHERE status_id = $1 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED"
        );
        let candidate = sqlx::query_as::<_, Dataset>(&select_query)
            .bind(DatasetStatus::Pending.id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let update_query = format!(
            "UPDATE datasets \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DATASET_COLUMNS}"
        );
        let dataset = sqlx::query_as::<_, Dataset>(&update_query)
            .bind(candidate.id)
            .bind(DatasetStatus::Downloading.id())
            .fetch_one(&mut *tx)
            .await?;

        let insert_query = format!(
            "INSERT INTO download_tasks (dataset_id, client_id, status_id, last_heartbeat) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, DownloadTask>(&insert_query)
            .bind(dataset.id)
            .bind(client_id)
            .bind(TaskStatus::Active.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((task, dataset)))
    }

    /// Find a task by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DownloadTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM download_tasks WHERE id = $1");
        sqlx::query_as::<_, DownloadTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the lease attempts accumulated by one dataset, newest first.
    pub async fn list_by_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<DownloadTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM download_tasks \
             WHERE dataset_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, DownloadTask>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Touch `last_heartbeat` on an ACTIVE task owned by `client_id`.
    ///
    /// Returns the updated row, or `None` when the task does not exist, is
    /// not ACTIVE, or belongs to a different client — callers disambiguate.
    pub async fn heartbeat(
        pool: &PgPool,
        task_id: DbId,
        client_id: &str,
    ) -> Result<Option<DownloadTask>, sqlx::Error> {
        let query = format!(
            "UPDATE download_tasks \
             SET last_heartbeat = NOW() \
             WHERE id = $1 AND client_id = $2 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DownloadTask>(&query)
            .bind(task_id)
            .bind(client_id)
            .bind(TaskStatus::Active.id())
            .fetch_optional(pool)
            .await
    }

    /// Close a lease after a verified checksum match.
    ///
    /// The task update is a CAS on `status_id = ACTIVE`: if a timeout sweep
    /// reclaimed the lease first, zero rows match and `None` is returned
    /// with nothing written. On success the dataset moves to COMPLETED in
    /// the same transaction.
    pub async fn complete(
        pool: &PgPool,
        task_id: DbId,
        actual_md5: &str,
        storage_path: Option<&str>,
    ) -> Result<Option<DownloadTask>, sqlx::Error> {
        Self::close(
            pool,
            task_id,
            TaskStatus::Completed,
            DatasetStatus::Completed,
            actual_md5,
            storage_path,
            None,
        )
        .await
    }

    /// Close a lease after a checksum mismatch.
    ///
    /// Same CAS discipline as [`Self::complete`]; the dataset moves to
    /// FAILED and the task records the offending digest and error message.
    pub async fn fail(
        pool: &PgPool,
        task_id: DbId,
        actual_md5: &str,
        error_message: &str,
    ) -> Result<Option<DownloadTask>, sqlx::Error> {
        Self::close(
            pool,
            task_id,
            TaskStatus::Failed,
            DatasetStatus::Failed,
            actual_md5,
            None,
            Some(error_message),
        )
        .await
    }

    /// Shared closure path for [`Self::complete`] and [`Self::fail`].
    async fn close(
        pool: &PgPool,
        task_id: DbId,
        task_status: TaskStatus,
        dataset_status: DatasetStatus,
        actual_md5: &str,
        storage_path: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<Option<DownloadTask>, sqlx::Error> {
        debug_assert!(TaskStatus::Active.can_transition_to(task_status));
        debug_assert!(DatasetStatus::Downloading.can_transition_to(dataset_status));

        let mut tx = pool.begin().await?;

        let task_query = format!(
            "UPDATE download_tasks \
             SET status_id = $2, actual_md5 = $3, storage_path = $4, \
                 error_message = $5, completed_at = NOW() \
             WHERE id = $1 AND status_id = $6 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, DownloadTask>(&task_query)
            .bind(task_id)
            .bind(task_status.id())
            .bind(actual_md5)
            .bind(storage_path)
            .bind(error_message)
            .bind(TaskStatus::Active.id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(task) = task else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE datasets \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(task.dataset_id)
        .bind(dataset_status.id())
        .bind(DatasetStatus::Downloading.id())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(task))
    }

    /// Reclaim every ACTIVE lease whose heartbeat has gone stale.
    ///
    /// A lease is stale when `last_heartbeat` is non-null and older than
    /// `timeout_seconds`. Tasks that have never heartbeated
    /// (`last_heartbeat IS NULL`) are left alone. Reclaimed tasks move to
    /// TIMEOUT and their datasets re-enter the PENDING backlog. Rows locked
    /// by an in-flight completion are skipped rather than waited on —
    /// whichever transaction commits first wins.
    ///
    /// Idempotent: a second immediate sweep matches nothing, since
    /// reclaimed tasks are no longer ACTIVE.
    pub async fn sweep_timed_out(
        pool: &PgPool,
        timeout_seconds: i64,
    ) -> Result<Vec<ReclaimedLease>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let expired: Vec<ReclaimedLease> = sqlx::query_as(
            "SELECT t.id AS task_id, t.dataset_id, d.url AS dataset_url, \
                    t.client_id, t.last_heartbeat \
             FROM download_tasks t \
             JOIN datasets d ON d.id = t.dataset_id \
             WHERE t.status_id = $1 \
               AND t.last_heartbeat IS NOT NULL \
               AND t.last_heartbeat < NOW() - make_interval(secs => $2) \
             ORDER BY t.last_heartbeat ASC \
             FOR UPDATE OF t SKIP LOCKED",
        )
        .bind(TaskStatus::Active.id())
        .bind(timeout_seconds as f64)
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            return Ok(Vec::new());
        }

        let task_ids: Vec<DbId> = expired.iter().map(|lease| lease.task_id).collect();
        let dataset_ids: Vec<DbId> = expired.iter().map(|lease| lease.dataset_id).collect();

        sqlx::query("UPDATE download_tasks SET status_id = $2 WHERE id = ANY($1)")
            .bind(&task_ids)
            .bind(TaskStatus::Timeout.id())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE datasets \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = ANY($1) AND status_id = $3",
        )
        .bind(&dataset_ids)
        .bind(DatasetStatus::Pending.id())
        .bind(DatasetStatus::Downloading.id())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(expired
            .into_iter()
            .map(|lease| ReclaimedLease {
                timeout_seconds,
                ..lease
            })
            .collect())
    }
}
