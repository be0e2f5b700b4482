//! End-to-end HTTP flows: register, login, tag and article lifecycle.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{body_json, send, token_for};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app.clone(), method, uri, Some(token), body).await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn create_tag(app: &Router, token: &str, name: &str) -> String {
    let body = json!({ "name": name });
    let (status, json) = call(app, Method::POST, "/api/v1/tags", token, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["serial"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn register_then_login_issues_a_usable_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let credentials = json!({ "username": "alice", "password": "s3cret", "role": "writer" });

    let register = "/api/v1/users/register";
    let response = send(app.clone(), Method::POST, register, None, Some(credentials.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "alice");
    assert!(json["data"].get("password_hash").is_none());

    let response = send(app.clone(), Method::POST, register, None, Some(credentials)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        app.clone(),
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        app.clone(),
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice", "password": "s3cret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["user"]["role"], "writer");

    let (status, _) = call(&app, Method::GET, "/api/v1/tags", &token, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn publish_flow_moves_tag_statistics(pool: PgPool) {
    let app = common::build_test_app(pool);
    let writer = token_for("wendy", "writer");
    let editor = token_for("ed", "editor");
    let admin = token_for("root", "admin");

    let rust = create_tag(&app, &writer, "rust").await;
    let rust_uri = format!("/api/v1/tags/{rust}");
    let web = create_tag(&app, &writer, "web").await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/articles",
        &writer,
        Some(json!({ "title": "Hello", "content": "World", "tag_serials": [rust, web] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["author_username"], "wendy");
    assert_eq!(json["data"]["version"]["status"], "draft");
    let article = json["data"]["article_serial"].as_str().unwrap().to_string();
    let version = json["data"]["version"]["serial"].as_str().unwrap().to_string();

    // Editors only ever see published versions.
    let (_, json) = call(&app, Method::GET, "/api/v1/articles?status=draft", &editor, None).await;
    assert_eq!(json["pagination"]["total"], 0);
    let (_, json) = call(&app, Method::GET, "/api/v1/articles?status=draft", &writer, None).await;
    assert_eq!(json["pagination"]["total"], 1);

    let (status, json) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/articles/{article}/versions/{version}/status"),
        &writer,
        Some(json!({ "status": "published" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["outcome"], "published");

    let (_, json) = call(&app, Method::GET, &rust_uri, &writer, None).await;
    assert_eq!(json["data"]["usage_count"], 1);
    assert!(json["data"]["trending_score"].as_f64().unwrap() > 0.0);

    let (_, json) = call(&app, Method::GET, "/api/v1/articles", &editor, None).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["serial"], version.as_str());

    let (_, json) = call(
        &app,
        Method::GET,
        &format!("/api/v1/articles/{article}/latest-details"),
        &writer,
        None,
    )
    .await;
    assert_eq!(json["data"]["published_version"]["serial"], version.as_str());

    let uri = "/api/v1/tags/trending-score";
    let (status, json) = call(&app, Method::PUT, uri, &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["tags_updated"], 2);

    let uri = format!("/api/v1/articles/{article}");
    let (status, json) = call(&app, Method::DELETE, &uri, &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["unpublished_version_serial"], version.as_str());

    let (_, json) = call(&app, Method::GET, &rust_uri, &writer, None).await;
    assert_eq!(json["data"]["usage_count"], 0);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/articles/{article}/versions"),
        &writer,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn invalid_requests_map_to_client_errors(pool: PgPool) {
    let app = common::build_test_app(pool);
    let writer = token_for("wendy", "writer");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/articles",
        &writer,
        Some(json!({ "title": "T", "content": "C", "tag_serials": ["TAGmissing"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let uri = "/api/v1/articles?sort_by=title";
    let (status, _) = call(&app, Method::GET, uri, &writer, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = "/api/v1/articles/versions/VERmissing";
    let (status, _) = call(&app, Method::GET, uri, &writer, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create_tag(&app, &writer, "rust").await;
    let body = json!({ "name": "rust" });
    let (status, json) = call(&app, Method::POST, "/api/v1/tags", &writer, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}
