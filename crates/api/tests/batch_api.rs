//! Integration tests for `POST /datasets/batch` (bulk ingest).

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;

const MD5_A: &str = "d41d8cd98f00b204e9800998ecf8427e";
const MD5_B: &str = "9e107d9d372bb6826bd81d3542a419d6";

// ---------------------------------------------------------------------------
// Test: all-new batch returns 201 with every dataset created
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn all_new_batch_returns_201(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
            { "url": "https://x/file2.zip", "expected_md5": MD5_B },
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["code"], 201);
    assert_eq!(json["data"]["created_count"], 2);
    assert_eq!(json["data"]["skipped_count"], 0);
    assert_eq!(json["data"]["datasets"].as_array().unwrap().len(), 2);

    // Newly created datasets start out pending (status id 1).
    assert_eq!(json["data"]["datasets"][0]["status_id"], 1);
}

// ---------------------------------------------------------------------------
// Test: duplicate within the same batch is skipped with 207
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn in_batch_duplicate_returns_207(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);

    let json = body_json(response).await;
    assert_eq!(json["data"]["created_count"], 1);
    assert_eq!(json["data"]["skipped_count"], 1);
}

// ---------------------------------------------------------------------------
// Test: previously persisted fingerprint is skipped across batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn persisted_duplicate_returns_207_even_when_nothing_created(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(
        app.clone(),
        "/datasets/batch",
        json!([{ "url": "https://x/file1.zip", "expected_md5": MD5_A }]),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    // The whole second batch is duplicates: still 207, created_count = 0.
    let second = post_json(
        app.clone(),
        "/datasets/batch",
        json!([{ "url": "https://x/file1.zip", "expected_md5": MD5_A }]),
    )
    .await;
    assert_eq!(second.status(), StatusCode::MULTI_STATUS);

    let json = body_json(second).await;
    assert_eq!(json["data"]["created_count"], 0);
    assert_eq!(json["data"]["skipped_count"], 1);
}

// ---------------------------------------------------------------------------
// Test: same URL with a different checksum is a distinct fingerprint
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_url_different_md5_is_not_a_duplicate(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
            { "url": "https://x/file1.zip", "expected_md5": MD5_B },
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["created_count"], 2);
    assert_eq!(json["data"]["skipped_count"], 0);
}

// ---------------------------------------------------------------------------
// Test: checksum case variants share one fingerprint
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn md5_case_variants_dedupe_together(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
            { "url": "https://x/file1.zip", "expected_md5": MD5_A.to_uppercase() },
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);

    let json = body_json(response).await;
    assert_eq!(json["data"]["created_count"], 1);
    assert_eq!(json["data"]["skipped_count"], 1);

    // The stored checksum is lowercase-normalized.
    assert_eq!(json["data"]["datasets"][0]["expected_md5"], MD5_A);
}

// ---------------------------------------------------------------------------
// Test: empty batch is rejected with 400
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_batch_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app.clone(), "/datasets/batch", json!([])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], 400);
}

// ---------------------------------------------------------------------------
// Test: one malformed checksum rejects the whole batch with no side effects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_md5_rejects_whole_batch(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/file1.zip", "expected_md5": MD5_A },
            { "url": "https://x/file2.zip", "expected_md5": "not-a-checksum" },
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was created — validation is all-or-nothing.
    let list = get(app, "/datasets").await;
    let json = body_json(list).await;
    assert_eq!(json["data"]["total"], 0);
}

// ---------------------------------------------------------------------------
// Test: created + skipped always equals submitted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn created_plus_skipped_equals_submitted(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/datasets/batch",
        json!([
            { "url": "https://x/a.zip", "expected_md5": MD5_A },
            { "url": "https://x/a.zip", "expected_md5": MD5_A },
            { "url": "https://x/b.zip", "expected_md5": MD5_A },
            { "url": "https://x/b.zip", "expected_md5": MD5_B },
            { "url": "https://x/a.zip", "expected_md5": MD5_A },
        ]),
    )
    .await;

    let json = body_json(response).await;
    let created = json["data"]["created_count"].as_i64().unwrap();
    let skipped = json["data"]["skipped_count"].as_i64().unwrap();
    assert_eq!(created + skipped, 5);
    assert_eq!(created, 3);
}
