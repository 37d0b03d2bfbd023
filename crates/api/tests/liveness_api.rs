//! Integration tests for heartbeats and the timeout sweep.
//!
//! The sweep is exercised through `DownloadTaskRepo::sweep_timed_out`
//! directly — the background loop in `background::lease_sweeper` is a thin
//! scheduler around the same repository call — with heartbeat ages rewound
//! via SQL, since the tests cannot wait out real timeouts.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, request_task, seed_datasets};
use serde_json::json;
use sqlx::PgPool;

use datapool_db::repositories::DownloadTaskRepo;

const MD5_A: &str = "d41d8cd98f00b204e9800998ecf8427e";
const MD5_B: &str = "9e107d9d372bb6826bd81d3542a419d6";

/// Rewind a task's heartbeat by `seconds`.
async fn age_heartbeat(pool: &PgPool, task_id: i64, seconds: i64) {
    sqlx::query(
        "UPDATE download_tasks \
         SET last_heartbeat = NOW() - make_interval(secs => $2) \
         WHERE id = $1",
    )
    .bind(task_id)
    .bind(seconds as f64)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: heartbeat refreshes last_heartbeat on an owned ACTIVE task
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn heartbeat_updates_timestamp(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    seed_datasets(&app, &[("https://x/a.zip", MD5_A)]).await;
    let grant = request_task(&app, "worker-1").await;
    let task_id = grant["data"]["task_id"].as_i64().unwrap();

    age_heartbeat(&pool, task_id, 60).await;

    let response = post_json(
        app.clone(),
        &format!("/tasks/{task_id}/heartbeat"),
        json!({ "client_id": "worker-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["task_id"].as_i64().unwrap(), task_id);

    // The aged heartbeat was replaced with a fresh one: the task no longer
    // qualifies for a 30-second sweep.
    let reclaimed = DownloadTaskRepo::sweep_timed_out(&pool, 30).await.unwrap();
    assert!(reclaimed.is_empty());
}

// ---------------------------------------------------------------------------
// Test: heartbeat against an unknown task is 404
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn heartbeat_unknown_task_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/tasks/9999/heartbeat",
        json!({ "client_id": "worker-1" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], 404);
}

// ---------------------------------------------------------------------------
// Test: heartbeat from the wrong client is rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn heartbeat_from_wrong_client_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);

    seed_datasets(&app, &[("https://x/a.zip", MD5_A)]).await;
    let grant = request_task(&app, "worker-1").await;
    let task_id = grant["data"]["task_id"].as_i64().unwrap();

    let response = post_json(
        app,
        &format!("/tasks/{task_id}/heartbeat"),
        json!({ "client_id": "someone-else" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: stale lease is reclaimed, fresh lease is not
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_reclaims_only_stale_leases(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    seed_datasets(
        &app,
        &[("https://x/stale.zip", MD5_A), ("https://x/fresh.zip", MD5_B)],
    )
    .await;

    let stale_grant = request_task(&app, "stale-worker").await;
    let fresh_grant = request_task(&app, "fresh-worker").await;
    let stale_task = stale_grant["data"]["task_id"].as_i64().unwrap();
    let fresh_task = fresh_grant["data"]["task_id"].as_i64().unwrap();
    let stale_dataset = stale_grant["data"]["dataset"]["id"].as_i64().unwrap();
    let fresh_dataset = fresh_grant["data"]["dataset"]["id"].as_i64().unwrap();

    // 31s old vs 10s old against a 30s timeout.
    age_heartbeat(&pool, stale_task, 31).await;
    age_heartbeat(&pool, fresh_task, 10).await;

    let reclaimed = DownloadTaskRepo::sweep_timed_out(&pool, 30).await.unwrap();
    assert_eq!(reclaimed.len(), 1);

    let report = &reclaimed[0];
    assert_eq!(report.task_id, stale_task);
    assert_eq!(report.dataset_id, stale_dataset);
    assert_eq!(report.dataset_url, "https://x/stale.zip");
    assert_eq!(report.client_id, "stale-worker");
    assert_eq!(report.timeout_seconds, 30);

    // Reclaimed task is TIMEOUT (2); its dataset re-entered the backlog.
    let task = body_json(get(app.clone(), &format!("/tasks/{stale_task}")).await).await;
    assert_eq!(task["data"]["status_id"], 2);
    let dataset =
        body_json(get(app.clone(), &format!("/datasets/{stale_dataset}")).await).await;
    assert_eq!(dataset["data"]["status_id"], 1);

    // The fresh lease and its dataset are untouched.
    let task = body_json(get(app.clone(), &format!("/tasks/{fresh_task}")).await).await;
    assert_eq!(task["data"]["status_id"], 1);
    let dataset = body_json(get(app, &format!("/datasets/{fresh_dataset}")).await).await;
    assert_eq!(dataset["data"]["status_id"], 2);
}

// ---------------------------------------------------------------------------
// Test: a second immediate sweep reclaims nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_is_idempotent(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    seed_datasets(&app, &[("https://x/a.zip", MD5_A)]).await;
    let grant = request_task(&app, "worker-1").await;
    age_heartbeat(&pool, grant["data"]["task_id"].as_i64().unwrap(), 120).await;

    let first = DownloadTaskRepo::sweep_timed_out(&pool, 30).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = DownloadTaskRepo::sweep_timed_out(&pool, 30).await.unwrap();
    assert!(second.is_empty());
}

// ---------------------------------------------------------------------------
// Test: a task that never heartbeated is never reclaimed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn null_heartbeat_is_never_timed_out(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    seed_datasets(&app, &[("https://x/a.zip", MD5_A)]).await;
    let grant = request_task(&app, "worker-1").await;
    let task_id = grant["data"]["task_id"].as_i64().unwrap();

    sqlx::query("UPDATE download_tasks SET last_heartbeat = NULL WHERE id = $1")
        .bind(task_id)
        .execute(&pool)
        .await
        .unwrap();

    // Even a zero-second timeout must not reclaim it.
    let reclaimed = DownloadTaskRepo::sweep_timed_out(&pool, 0).await.unwrap();
    assert!(reclaimed.is_empty());

    let task = body_json(get(app, &format!("/tasks/{task_id}")).await).await;
    assert_eq!(task["data"]["status_id"], 1);
}

// ---------------------------------------------------------------------------
// Test: a reclaimed dataset can be claimed again by another worker
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reclaimed_dataset_is_reassignable(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let dataset_id = seed_datasets(&app, &[("https://x/a.zip", MD5_A)]).await[0];
    let grant = request_task(&app, "dead-worker").await;
    age_heartbeat(&pool, grant["data"]["task_id"].as_i64().unwrap(), 120).await;

    DownloadTaskRepo::sweep_timed_out(&pool, 30).await.unwrap();

    // The same dataset comes back out of the backlog under a new lease.
    let regrant = request_task(&app, "live-worker").await;
    assert_eq!(regrant["data"]["dataset"]["id"].as_i64().unwrap(), dataset_id);
    assert_ne!(
        regrant["data"]["task_id"].as_i64().unwrap(),
        grant["data"]["task_id"].as_i64().unwrap()
    );
}
