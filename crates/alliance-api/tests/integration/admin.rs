//! Integration tests for the admin routes.

use http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::common::{request, TestHarness};

#[tokio::test]
async fn test_admin_routes_refuse_students() {
    let harness = TestHarness::new().await;
    let id = Uuid::new_v4();
    for uri in [
        "/admin/stats".to_string(),
        "/admin/students".to_string(),
        "/admin/analytics/summary".to_string(),
        format!("/admin/sessions/{id}/pdf"),
        format!("/admin/student/{id}/summary-pdf"),
    ] {
        let (status, body) = harness.get(&uri, &harness.student.token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["detail"], "Admin only");
    }

    let (status, _) = harness.call(Method::GET, "/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stats_and_students() {
    let harness = TestHarness::new().await;
    let (_, stats) = harness.get("/admin/stats", &harness.admin.token).await;
    assert_eq!(stats, json!({ "students": 0, "sessions_completed": 0 }));

    harness.evaluated_first_session().await;

    let (status, stats) = harness.get("/admin/stats", &harness.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "students": 1, "sessions_completed": 1 }));

    let (status, body) = harness.get("/admin/students", &harness.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    let students = body["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["user_id"], harness.student.id.to_string());
    assert_eq!(students[0]["email"], harness.student.email);
    assert_eq!(students[0]["level"], "autre");
    assert!(students[0].get("role").is_none());
}

#[tokio::test]
async fn test_student_sessions_listing() {
    let harness = TestHarness::new().await;
    harness.student_session(1).await;

    let uri = format!("/admin/student/{}/sessions", harness.student.id);
    let (status, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 16);
    assert_eq!(sessions[0]["session_number"], 1);
    assert!(sessions[0]["difficulty"].is_string());

    let uri = format!("/admin/student/{}/sessions", Uuid::new_v4());
    let (_, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(body, json!({ "sessions": [] }));
}

#[tokio::test]
async fn test_session_feedback_shows_internal_fields() {
    let harness = TestHarness::new().await;
    let id = harness.student_session(1).await;
    let uri = format!("/admin/sessions/{id}/feedback");

    let (status, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No feedback for this session");

    harness.evaluated_first_session().await;

    let (status, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skill_indicators"]["active_listening"], true);
    assert_eq!(body["kpis"]["open_questions_ratio"], 0.5);
}

#[tokio::test]
async fn test_session_pdf() {
    let harness = TestHarness::new().await;
    let missing = format!("/admin/sessions/{}/pdf", Uuid::new_v4());
    let (status, body) = harness.get(&missing, &harness.admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Session not found");

    let id = harness.student_session(1).await;
    let uri = format!("/admin/sessions/{id}/pdf");
    let (status, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No feedback for this session yet");

    harness.evaluated_first_session().await;

    let (status, headers, bytes) = harness
        .send(request(Method::GET, &uri, Some(harness.admin.token.as_str()), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[http::header::CONTENT_TYPE], "application/pdf");
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_summary_pdf() {
    let harness = TestHarness::new().await;
    let uri = format!("/admin/student/{}/summary-pdf", harness.student.id);
    let (status, body) = harness.get(&uri, &harness.admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Student has no sessions");

    harness.evaluated_first_session().await;

    let (status, headers, bytes) = harness
        .send(request(Method::GET, &uri, Some(harness.admin.token.as_str()), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[http::header::CONTENT_TYPE], "application/pdf");
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_analytics_summary() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .get("/admin/analytics/summary", &harness.admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["overall_avg"]["empathy"].is_null());

    harness.evaluated_first_session().await;

    let (_, body) = harness
        .get("/admin/analytics/summary", &harness.admin.token)
        .await;
    assert_eq!(body["overall_avg"]["empathy"], 4.0);
    assert_eq!(body["by_level_avg"]["autre"]["alliance"], 5.0);
    assert_eq!(body["by_session_number_avg"]["1"]["structure"], 3.0);
}
