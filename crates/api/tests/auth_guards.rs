//! Authentication and role checks that reject a request before any query
//! runs. These use a lazily connecting pool and need no database.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, lazy_pool, send, token_for};
use serde_json::json;

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/api/v1/articles").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("x-request-id").is_some());
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = common::build_test_app(lazy_pool());
    let response = send(app, Method::GET, "/api/v1/articles", Some("not-a-jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_writers_create_articles() {
    let body = json!({ "title": "T", "content": "C", "tag_serials": [] });
    for role in ["editor", "admin"] {
        let app = common::build_test_app(lazy_pool());
        let token = token_for("someone", role);
        let response = send(
            app,
            Method::POST,
            "/api/v1/articles",
            Some(&token),
            Some(body.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "role {role}");
    }
}

#[tokio::test]
async fn editors_cannot_manage_tags() {
    let app = common::build_test_app(lazy_pool());
    let token = token_for("ed", "editor");
    let response = send(app, Method::GET, "/api/v1/tags", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_refresh_trending_scores() {
    let app = common::build_test_app(lazy_pool());
    let token = token_for("wendy", "writer");
    let response = send(
        app,
        Method::PUT,
        "/api/v1/tags/trending-score",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn register_rejects_unknown_role() {
    let app = common::build_test_app(lazy_pool());
    let response = send(
        app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({ "username": "alice", "password": "pw", "role": "reader" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
