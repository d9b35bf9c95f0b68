//! Student routes: profile, dashboard, sessions, chat, feedback.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use alliance_core::program::{
    available_session_number, current_session, ensure_sessions_seeded, gender_label,
};
use alliance_core::{
    Gender, Language, Level, ProfilePreferences, QuestionnaireAnswer, Session, SessionStatus,
    StudentFeedbackView,
};

use crate::error::{ApiError, Result};
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::simulation::ChatReply;
use crate::state::AppState;

/// Authenticated student routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/profile", post(update_profile))
        .route("/student/dashboard", get(dashboard))
        .route("/student/badges", get(badges))
        .route("/student/sessions/current", get(current))
        .route("/student/sessions/current-id", get(current_id))
        .route("/student/sessions/{session_id}/chat", post(chat))
        .route("/student/sessions/{session_id}/end", post(end))
        .route(
            "/student/sessions/{session_id}/generate-feedback",
            post(generate_feedback),
        )
        .route(
            "/student/sessions/{session_id}/questionnaire",
            post(questionnaire),
        )
}

// ============================================================================
// Profile
// ============================================================================

/// Sign-up choices.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    /// Academic year
    pub level: Level,
    /// Simulation language
    #[serde(default)]
    pub preferred_language: Language,
}

async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Value>> {
    state
        .store
        .upsert_preferences(
            user.user_id,
            ProfilePreferences {
                level: update.level,
                preferred_language: update.preferred_language,
            },
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

// ============================================================================
// Dashboard
// ============================================================================

/// A session as listed on the dashboard.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    /// Session ID
    pub id: Uuid,
    /// Position in the program
    pub session_number: u8,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Age of the simulated patient
    pub patient_age: u8,
    /// Gender of the simulated patient
    pub patient_gender: Gender,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            session_number: s.session_number,
            status: s.status,
            patient_age: s.patient_age,
            patient_gender: s.patient_gender,
        }
    }
}

/// Progress overview.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    /// Completed sessions
    pub completed: usize,
    /// Session to work on next
    pub available_session_number: u8,
    /// All sessions by number
    pub sessions: Vec<SessionSummary>,
    /// Earned badge codes
    pub badges: Vec<String>,
}

async fn dashboard(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Dashboard>> {
    let sessions = ensure_sessions_seeded(state.store.as_ref(), user.user_id).await?;
    let badges = state.store.badges(user.user_id).await?;
    Ok(Json(Dashboard {
        completed: sessions.iter().filter(|s| s.is_completed()).count(),
        available_session_number: available_session_number(&sessions),
        sessions: sessions.iter().map(SessionSummary::from).collect(),
        badges: badges.into_iter().map(|b| b.badge_code).collect(),
    }))
}

async fn badges(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let badges: Vec<Value> = state
        .store
        .badges(user.user_id)
        .await?
        .into_iter()
        .map(|b| json!({ "badge_code": b.badge_code }))
        .collect();
    Ok(Json(json!({ "badges": badges })))
}

// ============================================================================
// Current session
// ============================================================================

async fn current(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let sessions = ensure_sessions_seeded(state.store.as_ref(), user.user_id).await?;
    let Some(session) = current_session(&sessions) else {
        return Ok(Json(json!({ "done": true })));
    };
    let language = user.profile.preferred_language;
    Ok(Json(json!({
        "session_id": session.id,
        "session_number": session.session_number,
        "status": session.status,
        "patient_age": session.patient_age,
        "patient_gender_label": gender_label(session.patient_age, session.patient_gender, language),
    })))
}

async fn current_id(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let sessions = ensure_sessions_seeded(state.store.as_ref(), user.user_id).await?;
    let session = current_session(&sessions)
        .ok_or_else(|| ApiError::not_found("No available session"))?;
    Ok(Json(json!({
        "session_id": session.id,
        "session_number": session.session_number,
    })))
}

// ============================================================================
// Consultation
// ============================================================================

/// A student turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// What the student says
    pub message: String,
}

async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>> {
    let reply = state
        .simulation
        .send_message(&user.profile, session_id, &request.message)
        .await?;
    Ok(Json(reply))
}

async fn end(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let session = state.simulation.end_session(user.user_id, session_id).await?;
    Ok(Json(json!({ "session_id": session.id, "status": session.status })))
}

async fn generate_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<StudentFeedbackView>> {
    let view = state
        .simulation
        .generate_feedback(&user.profile, session_id)
        .await?;
    Ok(Json(view))
}

/// Post-feedback questionnaire.
#[derive(Debug, Deserialize)]
pub struct QuestionnaireForm {
    /// First Likert answer
    pub q1: u8,
    /// Second Likert answer
    pub q2: u8,
    /// Free-text answer
    pub open_answer: String,
}

async fn questionnaire(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(form): ApiJson<QuestionnaireForm>,
) -> Result<Json<Value>> {
    state
        .simulation
        .submit_questionnaire(QuestionnaireAnswer {
            session_id,
            user_id: user.user_id,
            q1: form.q1,
            q2: form.q2,
            open_answer: form.open_answer,
        })
        .await?;
    Ok(Json(json!({ "ok": true })))
}
