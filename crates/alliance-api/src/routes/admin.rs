//! Administrator routes: statistics, student listings, reports.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use http::header;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use alliance_core::analytics::{summarize, AnalyticsSummary};
use alliance_core::{FeedbackReport, Language, Level, Role, Session, SessionStatus};
use alliance_pdf::{SessionReport, SummaryReport};

use crate::error::{ApiError, Result};
use crate::extract::{AdminUser, ApiPath};
use crate::state::AppState;

/// Routes reserved to the admin role.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/students", get(students))
        .route("/admin/student/{user_id}/sessions", get(student_sessions))
        .route("/admin/student/{user_id}/summary-pdf", get(summary_pdf))
        .route("/admin/sessions/{session_id}/pdf", get(session_pdf))
        .route("/admin/sessions/{session_id}/feedback", get(session_feedback))
        .route("/admin/analytics/summary", get(analytics_summary))
}

/// Headline counters.
#[derive(Debug, Serialize)]
pub struct Stats {
    /// Student profiles
    pub students: u64,
    /// Sessions ended across all students
    pub sessions_completed: u64,
}

async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Stats>> {
    Ok(Json(Stats {
        students: state.store.count_profiles(Role::Student).await?,
        sessions_completed: state.store.count_sessions(SessionStatus::Completed).await?,
    }))
}

/// A student as listed to administrators.
#[derive(Debug, Serialize)]
pub struct StudentRow {
    /// User ID
    pub user_id: Uuid,
    /// Account email
    pub email: Option<String>,
    /// Academic year
    pub level: Level,
    /// Simulation language
    pub preferred_language: Language,
    /// Profile creation time
    pub created_at: DateTime<Utc>,
}

async fn students(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Value>> {
    let rows: Vec<StudentRow> = state
        .store
        .profiles(Some(Role::Student))
        .await?
        .into_iter()
        .map(|p| StudentRow {
            user_id: p.user_id,
            email: p.email,
            level: p.level,
            preferred_language: p.preferred_language,
            created_at: p.created_at,
        })
        .collect();
    Ok(Json(json!({ "students": rows })))
}

async fn student_sessions(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let sessions: Vec<Session> = state.store.sessions_for_user(user_id).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

async fn session_feedback(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<FeedbackReport>> {
    let feedback = state
        .store
        .feedback(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No feedback for this session"))?;
    Ok(Json(feedback.admin_view()))
}

async fn analytics_summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AnalyticsSummary>> {
    let feedback = state.store.all_feedback().await?;
    let sessions = state.store.all_sessions().await?;
    let profiles = state.store.profiles(None).await?;
    Ok(Json(summarize(&feedback, &sessions, &profiles)))
}

// ============================================================================
// PDF exports
// ============================================================================

fn pdf_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response()
}

async fn session_pdf(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Response> {
    let session = state
        .store
        .session(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    let feedback = state
        .store
        .feedback(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No feedback for this session yet"))?;
    let transcript = state.store.transcript(session_id).await?;
    let academic_year = state.store.profile(session.user_id).await?.map(|p| p.level);

    let bytes = SessionReport {
        session: &session,
        feedback: &feedback,
        transcript: &transcript,
        academic_year,
    }
    .render();
    tracing::info!(
        admin = %admin.user_id,
        session_id = %session_id,
        bytes = bytes.len(),
        "Exported session PDF"
    );
    Ok(pdf_response(bytes))
}

async fn summary_pdf(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Response> {
    let sessions = state.store.sessions_for_user(user_id).await?;
    if sessions.is_empty() {
        return Err(ApiError::not_found("Student has no sessions"));
    }
    let feedback = state.store.feedback_for_user(user_id).await?;
    let profile = state.store.profile(user_id).await?;

    let bytes = SummaryReport {
        user_id,
        email: profile.as_ref().and_then(|p| p.email.as_deref()),
        academic_year: profile.as_ref().map(|p| p.level),
        sessions: &sessions,
        feedback: &feedback,
    }
    .render();
    tracing::info!(
        admin = %admin.user_id,
        student = %user_id,
        bytes = bytes.len(),
        "Exported summary PDF"
    );
    Ok(pdf_response(bytes))
}
