//! Repository for the `datasets` table.
//!
//! Uses `DatasetStatus` from `models::status` for all status transitions.
//! No magic numbers — every status literal is a named constant.

use sqlx::PgPool;

use datapool_core::types::DbId;

use crate::models::dataset::{BatchEntry, CatalogStats, Dataset};
use crate::models::status::{DatasetStatus, StatusId};

/// Column list for `datasets` queries.
const COLUMNS: &str = "\
    id, url, expected_md5, file_size, status_id, created_at, updated_at";

/// Provides catalog operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Ingest a validated batch of entries, deduplicating by the
    /// `(url, expected_md5)` fingerprint.
    ///
    /// Runs in a single transaction. Each entry is inserted with
    /// `ON CONFLICT DO NOTHING`; a missing `RETURNING` row means the
    /// fingerprint already existed — either persisted earlier or created by
    /// a preceding entry of this same batch — and counts as skipped.
    /// Returns the newly created rows and the skipped count.
    ///
    /// Callers must have validated and lowercase-normalized every
    /// `expected_md5` beforehand.
    pub async fn insert_batch(
        pool: &PgPool,
        entries: &[BatchEntry],
    ) -> Result<(Vec<Dataset>, i64), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO datasets (url, expected_md5, file_size, status_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (url, expected_md5) DO NOTHING \
             RETURNING {COLUMNS}"
        );

        let mut created = Vec::new();
        let mut skipped: i64 = 0;

        for entry in entries {
            let inserted = sqlx::query_as::<_, Dataset>(&query)
                .bind(&entry.url)
                .bind(&entry.expected_md5)
                .bind(entry.file_size)
                .bind(DatasetStatus::Pending.id())
                .fetch_optional(&mut *tx)
                .await?;

            match inserted {
                Some(dataset) => created.push(dataset),
                None => skipped += 1,
            }
        }

        tx.commit().await?;
        Ok((created, skipped))
    }

    /// Find a dataset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List datasets with an optional status filter, newest first.
    ///
    /// Returns the page of rows plus the unpaged total for the same filter.
    pub async fn list(
        pool: &PgPool,
        status_id: Option<StatusId>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Dataset>, i64), sqlx::Error> {
        let where_clause = if status_id.is_some() {
            "WHERE status_id = $1"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM datasets {where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(sid) = status_id {
            count_q = count_q.bind(sid);
        }
        let total = count_q.fetch_one(pool).await?;

        let offset = datapool_core::pagination::offset(page, page_size);
        let (limit_bind, offset_bind) = if status_id.is_some() {
            ("$2", "$3")
        } else {
            ("$1", "$2")
        };
        let list_query = format!(
            "SELECT {COLUMNS} FROM datasets {where_clause} \
             ORDER BY created_at DESC \
             LIMIT {limit_bind} OFFSET {offset_bind}"
        );

        let mut list_q = sqlx::query_as::<_, Dataset>(&list_query);
        if let Some(sid) = status_id {
            list_q = list_q.bind(sid);
        }
        let items = list_q.bind(page_size).bind(offset).fetch_all(pool).await?;

        Ok((items, total))
    }

    /// Reset a dataset to PENDING if its current status allows it.
    ///
    /// The status predicate doubles as the CAS guard: a dataset that was
    /// claimed (PENDING -> DOWNLOADING) between the caller's read and this
    /// update is left untouched and `None` is returned.
    pub async fn reset(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!(
            "UPDATE datasets \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .bind(DatasetStatus::Pending.id())
            .bind(DatasetStatus::Failed.id())
            .fetch_optional(pool)
            .await
    }

    /// Aggregate backlog counters: datasets per status plus active leases.
    pub async fn stats(pool: &PgPool) -> Result<CatalogStats, sqlx::Error> {
        let query = "\
            SELECT \
                COUNT(*) FILTER (WHERE status_id = $1) AS pending_datasets, \
                COUNT(*) FILTER (WHERE status_id = $2) AS downloading_datasets, \
                COUNT(*) FILTER (WHERE status_id = $3) AS completed_datasets, \
                COUNT(*) FILTER (WHERE status_id = $4) AS failed_datasets, \
                (SELECT COUNT(*) FROM download_tasks WHERE status_id = $5) AS active_tasks \
            FROM datasets";
        sqlx::query_as::<_, CatalogStats>(query)
            .bind(DatasetStatus::Pending.id())
            .bind(DatasetStatus::Downloading.id())
            .bind(DatasetStatus::Completed.id())
            .bind(DatasetStatus::Failed.id())
            .bind(crate::models::status::TaskStatus::Active.id())
            .fetch_one(pool)
            .await
    }
}
