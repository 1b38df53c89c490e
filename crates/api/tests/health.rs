//! Health endpoint and general HTTP behaviour of the middleware stack.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use sqlx::PgPool;
use tower::ServiceExt;

fn app() -> axum::Router {
    common::build_test_app(common::unreachable_pool())
}

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get(app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_ok_with_database(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(app(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_carries_a_request_id() {
    let response = get(app(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("response must carry x-request-id")
        .to_str()
        .unwrap();
    assert_eq!(request_id.len(), 36, "x-request-id should be a UUID string");
}

#[tokio::test]
async fn cors_preflight_allows_the_configured_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/wikis")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .expect("missing Access-Control-Allow-Origin")
            .to_str()
            .unwrap(),
        "http://localhost:5173"
    );
    let methods = headers
        .get("access-control-allow-methods")
        .expect("missing Access-Control-Allow-Methods")
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"), "got: {methods}");
}
