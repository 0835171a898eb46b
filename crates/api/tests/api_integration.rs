//! HTTP-level tests for routing, authentication and role checks.
//!
//! These run without a database: every request is rejected by the
//! middleware or payload validation before a query is made.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn health_check_is_public() {
    let app = common::test_app();

    let response = app
        .oneshot(get_request("/api/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn liveness_probe_is_public() {
    let app = common::test_app();

    let response = app
        .oneshot(get_request("/api/health/live", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for uri in [
        "/api/members",
        "/api/reservations",
        "/api/payments",
        "/api/dashboard/stats",
        "/api/notifications",
    ] {
        let app = common::test_app();
        let response = app.oneshot(get_request(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = common::test_app();

    let response = app
        .oneshot(get_request("/api/members", Some("not.a.jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_refuse_other_roles() {
    let token = common::issue_token(7, "coach");

    let app = common::test_app();
    let response = app
        .oneshot(get_request("/api/users", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_routes_refuse_coaches() {
    let token = common::issue_token(7, "coach");

    for uri in ["/api/members", "/api/subscriptions", "/api/payments"] {
        let app = common::test_app();
        let response = app.oneshot(get_request(uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn admin_routes_refuse_anonymous_callers() {
    let app = common::test_app();
    let response = app.oneshot(get_request("/api/users", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_validates_the_payload() {
    let app = common::test_app();

    let request = json_request(
        Method::POST,
        "/api/login",
        json!({ "email": "not-an-email", "password": "whatever" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    // The envelope names the failing field so forms can highlight it.
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|e| e["field"] == "email"));
}

#[tokio::test]
async fn reservation_payload_rejects_inverted_window() {
    let token = common::issue_token(1, "manager");

    let app = common::test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reservations")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "member_id": 1,
                "coach_id": 2,
                "service_id": 3,
                "start_time": "2025-03-01T11:00:00Z",
                "end_time": "2025-03-01T10:00:00Z"
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = common::test_app();

    let response = app
        .oneshot(get_request("/api/health", None))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn request_id_is_propagated_when_supplied() {
    let app = common::test_app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .header("x-request-id", "test-trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-trace-42"
    );
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let app = common::test_app();

    let response = app
        .oneshot(get_request("/api/does-not-exist", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
