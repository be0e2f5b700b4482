//! Readiness endpoint and the shared middleware stack.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, lazy_pool, send, token_for};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn health_is_ok_on_migrated_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("response must carry x-request-id");
    assert_eq!(request_id.to_str().unwrap().len(), 36);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["database"]["reachable"], true);
    assert_eq!(json["database"]["pending_migrations"], 0);
    assert_eq!(json["database"]["tracked_tags"], 0);
    assert_eq!(json["trending_half_life_days"], 7.0);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires DATABASE_URL"]
async fn health_reports_unmigrated_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "migrations_pending");
    assert_eq!(json["database"]["reachable"], true);
    assert!(json["database"]["pending_migrations"].as_u64().unwrap() > 0);
    assert!(json["database"]["tracked_tags"].is_null());
}

#[tokio::test]
async fn health_is_unavailable_without_database() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get("x-request-id").is_some());
    let json = body_json(response).await;
    assert_eq!(json["status"], "database_unreachable");
    assert_eq!(json["database"]["reachable"], false);
    assert!(json["database"]["pending_migrations"].is_null());
}

#[tokio::test]
async fn oversized_body_is_rejected_before_the_handler() {
    let app = common::build_test_app(lazy_pool());
    let token = token_for("wendy", "writer");
    let name = "x".repeat(common::test_config().max_body_bytes + 1);
    let response = send(
        app,
        Method::POST,
        "/api/v1/tags",
        Some(&token),
        Some(json!({ "name": name })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = common::build_test_app(lazy_pool());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/articles")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "PATCH")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert!(response.headers().get("access-control-allow-credentials").is_none());
}

#[tokio::test]
async fn cors_is_off_without_origins() {
    let mut config = common::test_config();
    config.cors_origins.clear();
    let app = common::build_test_app_with(lazy_pool(), config);
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/articles")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
