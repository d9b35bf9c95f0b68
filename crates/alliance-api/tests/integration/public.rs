//! Integration tests for routes reachable without a token.

use http::{Method, Request, StatusCode};
use serde_json::json;

use crate::common::{request, TestHarness, ORIGIN, PASSWORD};

#[tokio::test]
async fn test_health() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_login_returns_usable_token() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": harness.student.email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["user_id"], harness.student.id.to_string());
    assert_eq!(body["user"]["email"], harness.student.email);

    let token = body["access_token"].as_str().unwrap();
    let (status, _) = harness.get("/student/dashboard", token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": harness.student.email, "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_missing_field_is_unprocessable() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": harness.student.email })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_debug_auth_echoes_header() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .call(Method::GET, "/debug/auth", Some("abc"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authorization"], "Bearer abc");

    let (_, body) = harness.call(Method::GET, "/debug/auth", None, None).await;
    assert!(body["authorization"].is_null());
}

#[tokio::test]
async fn test_debug_db_checks_store() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.call(Method::GET, "/debug/db", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "rows": 1 }));
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let harness = TestHarness::new().await;
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/student/dashboard")
        .header(http::header::ORIGIN, ORIGIN)
        .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(http::header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, headers, _) = harness.send(preflight).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[http::header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ORIGIN
    );
    assert_eq!(headers[http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[http::header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let harness = TestHarness::new().await;
    let (status, _, _) = harness
        .send(request(Method::GET, "/nope", None, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
