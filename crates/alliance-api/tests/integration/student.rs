//! Integration tests for the student routes.

use http::{Method, StatusCode};
use serde_json::json;

use alliance_core::{Level, Store};

use crate::common::{TestHarness, PATIENT_REPLY};

#[tokio::test]
async fn test_student_routes_require_token() {
    let harness = TestHarness::new().await;
    for uri in ["/student/dashboard", "/student/badges", "/student/sessions/current"] {
        let (status, body) = harness.call(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body["detail"].is_string());
    }

    let (status, _) = harness.get("/student/dashboard", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_seeds_program() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.get("/student/dashboard", &harness.student.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], 0);
    assert_eq!(body["available_session_number"], 1);
    assert_eq!(body["badges"], json!([]));

    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 16);
    assert_eq!(sessions[0]["status"], "available");
    assert!(sessions[1..].iter().all(|s| s["status"] == "locked"));

    // Seeding twice keeps the same program.
    let (_, again) = harness.get("/student/dashboard", &harness.student.token).await;
    assert_eq!(again["sessions"], body["sessions"]);

    // The first request created the profile.
    let profile = harness.store.profile(harness.student.id).await.unwrap().unwrap();
    assert_eq!(profile.email.as_deref(), Some(harness.student.email));
}

#[tokio::test]
async fn test_profile_update() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .post(
            "/me/profile",
            &harness.student.token,
            json!({ "level": "4e", "preferred_language": "en" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let profile = harness.store.profile(harness.student.id).await.unwrap().unwrap();
    assert_eq!(profile.level, Level::Fourth);
    assert_eq!(profile.preferred_language.as_str(), "en");

    let (status, _) = harness
        .post("/me/profile", &harness.student.token, json!({ "level": "6e" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_current_session() {
    let harness = TestHarness::new().await;
    let (status, body) = harness
        .get("/student/sessions/current", &harness.student.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_number"], 1);
    assert_eq!(body["status"], "available");
    assert!(body["patient_gender_label"].is_string());

    let (status, id_body) = harness
        .get("/student/sessions/current-id", &harness.student.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_body["session_id"], body["session_id"]);
}

#[tokio::test]
async fn test_chat_end_and_feedback_flow() {
    let harness = TestHarness::new().await;
    let token = harness.student.token.clone();
    let id = harness.student_session(1).await;

    let (status, reply) = harness
        .post(
            &format!("/student/sessions/{id}/chat"),
            &token,
            json!({ "message": "Bonjour, qu'est-ce qui vous amène ?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["patient_message"], PATIENT_REPLY);
    assert_eq!(reply["session_number"], 1);
    assert_eq!(reply["language"], "fr");
    assert!(harness.patient.call_count() >= 1);

    // No feedback before the session ends.
    let feedback_uri = format!("/student/sessions/{id}/generate-feedback");
    let (status, _) = harness.call(Method::POST, &feedback_uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, ended) = harness
        .call(Method::POST, &format!("/student/sessions/{id}/end"), Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended, json!({ "session_id": id, "status": "completed" }));

    let (_, dashboard) = harness.get("/student/dashboard", &token).await;
    assert_eq!(dashboard["completed"], 1);
    assert_eq!(dashboard["available_session_number"], 2);
    assert_eq!(dashboard["sessions"][1]["status"], "available");
    assert_eq!(dashboard["badges"], json!(["MILESTONE_SESSION_1"]));

    let (status, feedback) = harness.call(Method::POST, &feedback_uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feedback["language"], "fr");
    assert_eq!(feedback["internal_scores"]["alliance"], 5);
    assert_eq!(
        feedback["student_facing"]["strengths"].as_array().unwrap().len(),
        3
    );
    assert!(feedback.get("skill_indicators").is_none());
    assert!(feedback.get("kpis").is_none());

    // A second request returns the stored feedback without asking the model.
    let calls = harness.evaluator.call_count();
    let (status, again) = harness.call(Method::POST, &feedback_uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, feedback);
    assert_eq!(harness.evaluator.call_count(), calls);

    // Chatting in a completed session is refused.
    let (status, body) = harness
        .post(&format!("/student/sessions/{id}/chat"), &token, json!({ "message": "Encore ?" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Session already completed");
}

#[tokio::test]
async fn test_chat_validation() {
    let harness = TestHarness::new().await;
    let token = harness.student.token.clone();
    let id = harness.student_session(1).await;
    let uri = format!("/student/sessions/{id}/chat");

    let (status, _) = harness.post(&uri, &token, json!({ "message": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = harness
        .post(&uri, &token, json!({ "message": "a".repeat(4001) }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = harness
        .post("/student/sessions/not-a-uuid/chat", &token, json!({ "message": "Bonjour" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let locked = harness.student_session(2).await;
    let (status, body) = harness
        .post(
            &format!("/student/sessions/{locked}/chat"),
            &token,
            json!({ "message": "Bonjour" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Session locked");
}

#[tokio::test]
async fn test_sessions_of_others_are_not_found() {
    let harness = TestHarness::new().await;
    let id = harness.student_session(1).await;

    let (status, body) = harness
        .post(
            &format!("/student/sessions/{id}/chat"),
            &harness.admin.token,
            json!({ "message": "Bonjour" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Session not found");
}

#[tokio::test]
async fn test_questionnaire_after_feedback() {
    let harness = TestHarness::new().await;
    let token = harness.student.token.clone();
    let id = harness.student_session(1).await;
    let uri = format!("/student/sessions/{id}/questionnaire");
    let answers = json!({ "q1": 4, "q2": 5, "open_answer": "Utile" });

    let (status, body) = harness.post(&uri, &token, answers.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Questionnaire after feedback");

    harness.evaluated_first_session().await;

    let (status, body) = harness.post(&uri, &token, answers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    let stored = harness.store.questionnaire(id).await.unwrap().unwrap();
    assert_eq!((stored.q1, stored.q2), (4, 5));

    let (status, _) = harness
        .post(&uri, &token, json!({ "q1": 9, "q2": 1, "open_answer": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_questionnaire_body_checked_before_feedback() {
    let harness = TestHarness::new().await;
    let token = harness.student.token.clone();
    let id = harness.student_session(1).await;
    let uri = format!("/student/sessions/{id}/questionnaire");

    let (status, _) = harness
        .post(&uri, &token, json!({ "q1": 9, "q2": 0, "open_answer": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = harness.post(&uri, &token, json!({ "q1": 4, "q2": 5 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(harness.store.questionnaire(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_badges_route() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.get("/student/badges", &harness.student.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "badges": [] }));

    harness.evaluated_first_session().await;

    let (_, body) = harness.get("/student/badges", &harness.student.token).await;
    assert_eq!(body, json!({ "badges": [{ "badge_code": "MILESTONE_SESSION_1" }] }));
}
