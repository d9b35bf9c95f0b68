//! Simulated consultations: chat, session end, evaluation, questionnaire.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use alliance_core::badges::{award_milestone_badge, award_skill_badges_if_ready, SKILL_BADGE_THRESHOLD};
use alliance_core::program::{completed_this_week, gender_label, unlock_next, WEEKLY_SESSION_LIMIT};
use alliance_core::{
    render_transcript, Error as CoreError, FeedbackReport, Language, NewMessage, Profile,
    QuestionnaireAnswer, Session, SessionStatus, Store, StudentFeedbackView,
};
use alliance_llm::{extract_json_object, CompletionRequest, LlmError, LlmProvider, Message};

use crate::error::ApiError;
use crate::prompts;

/// Inclusive bounds on a student message, in characters.
const MESSAGE_CHARS: std::ops::RangeInclusive<usize> = 1..=4000;

/// Turns sent to the evaluator.
const EVALUATION_TURNS: usize = 400;

const PATIENT_TEMPERATURE: f32 = 0.7;
const EVALUATOR_TEMPERATURE: f32 = 0.3;

/// Errors raised by the simulation flows.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SimulationError {
    /// Rule or storage failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The patient model failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The evaluator failed or produced unusable feedback.
    #[error("LLM unavailable: {0}")]
    FeedbackUnavailable(String),
}

/// Result type alias for simulation flows.
pub type Result<T> = std::result::Result<T, SimulationError>;

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Core(e) => e.into(),
            SimulationError::Llm(e) => e.into(),
            e @ SimulationError::FeedbackUnavailable(_) => ApiError::Unavailable(e.to_string()),
        }
    }
}

/// The patient's answer to a student message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// What the patient said
    pub patient_message: String,
    /// Language of the conversation
    pub language: Language,
    /// Session position in the program
    pub session_number: u8,
    /// Age of the simulated patient
    pub patient_age: u8,
    /// Localized patient label, e.g. `Femme`
    pub patient_gender_label: &'static str,
}

/// Runs the simulated consultation flows over a store and two models.
#[derive(Clone)]
pub struct SimulationService {
    store: Arc<dyn Store>,
    patient: Arc<dyn LlmProvider>,
    evaluator: Arc<dyn LlmProvider>,
    history_turns: usize,
}

impl SimulationService {
    /// Creates the service.
    pub fn new(
        store: Arc<dyn Store>,
        patient: Arc<dyn LlmProvider>,
        evaluator: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            patient,
            evaluator,
            history_turns: 30,
        }
    }

    /// Sets how many turns of history the patient sees.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns.max(1);
        self
    }

    /// A session of `user_id`; sessions of other students are not found.
    async fn owned_session(&self, user_id: Uuid, session_id: Uuid) -> Result<Session> {
        self.store
            .session(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| CoreError::not_found("Session not found").into())
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// Records a student message and returns the patient's reply.
    ///
    /// The first message of an available session starts it, subject to the
    /// weekly limit. The patient may speak first on an empty transcript.
    pub async fn send_message(
        &self,
        profile: &Profile,
        session_id: Uuid,
        text: &str,
    ) -> Result<ChatReply> {
        let chars = text.chars().count();
        if !MESSAGE_CHARS.contains(&chars) {
            return Err(CoreError::validation_field(
                "message",
                format!("expected 1 to 4000 characters, got {chars}"),
            )
            .into());
        }

        let user_id = profile.user_id;
        let language = profile.preferred_language;
        let mut session = self.owned_session(user_id, session_id).await?;

        match session.status {
            SessionStatus::Completed => {
                return Err(CoreError::invalid_state("Session already completed").into());
            }
            SessionStatus::Locked => return Err(CoreError::forbidden("Session locked").into()),
            SessionStatus::Available => self.start(&mut session).await?,
            SessionStatus::InProgress => {}
        }

        let transcript_empty = self.store.recent_messages(session_id, 1).await?.is_empty();
        if transcript_empty && session.patient_opening_starts {
            let context = prompts::patient_context(&session, language, true);
            let opening = self
                .ask_patient(language, prompts::opening_prompt(&context))
                .await?;
            self.store
                .append_message(NewMessage::patient(session_id, user_id, opening))
                .await?;
        }

        self.store
            .append_message(NewMessage::student(session_id, user_id, text))
            .await?;

        let history = self
            .store
            .recent_messages(session_id, self.history_turns)
            .await?;
        let context = prompts::patient_context(&session, language, session.patient_opening_starts);
        let reply = self
            .ask_patient(
                language,
                prompts::reply_prompt(&context, &render_transcript(&history)),
            )
            .await?;
        self.store
            .append_message(NewMessage::patient(session_id, user_id, reply.clone()))
            .await?;

        Ok(ChatReply {
            patient_message: reply,
            language,
            session_number: session.session_number,
            patient_age: session.patient_age,
            patient_gender_label: gender_label(session.patient_age, session.patient_gender, language),
        })
    }

    /// Moves an available session to in progress, enforcing the weekly limit.
    async fn start(&self, session: &mut Session) -> Result<()> {
        let sessions = self.store.sessions_for_user(session.user_id).await?;
        let now = Utc::now();
        if completed_this_week(&sessions, now) >= WEEKLY_SESSION_LIMIT {
            return Err(CoreError::forbidden("Limite: 2 sessions par semaine").into());
        }

        session.status = SessionStatus::InProgress;
        session.started_at = session.started_at.or(Some(now));
        self.store.update_session(session).await?;
        tracing::info!(
            user_id = %session.user_id,
            session_number = session.session_number,
            "Session started"
        );
        Ok(())
    }

    async fn ask_patient(&self, language: Language, prompt: String) -> Result<String> {
        let request = CompletionRequest::new(vec![Message::user(prompt)])
            .with_system_prompt(prompts::patient_system(language))
            .with_temperature(PATIENT_TEMPERATURE);
        let response = self.patient.complete(request).await?;
        tracing::debug!(tokens = response.tokens_used.total(), "Patient replied");
        Ok(response.content)
    }

    // ========================================================================
    // Session end
    // ========================================================================

    /// Completes a session, unlocks the next one and awards milestones.
    ///
    /// Ending a completed session returns it unchanged.
    pub async fn end_session(&self, user_id: Uuid, session_id: Uuid) -> Result<Session> {
        let mut session = self.owned_session(user_id, session_id).await?;
        match session.status {
            SessionStatus::Completed => return Ok(session),
            SessionStatus::Locked => return Err(CoreError::forbidden("Session locked").into()),
            SessionStatus::Available | SessionStatus::InProgress => {}
        }

        session.status = SessionStatus::Completed;
        session.ended_at = Some(Utc::now());
        self.store.update_session(&session).await?;

        let store = self.store.as_ref();
        unlock_next(store, user_id, session.session_number).await?;
        if award_milestone_badge(store, user_id, session.session_number).await? {
            tracing::info!(%user_id, session_number = session.session_number, "Milestone badge awarded");
        }
        tracing::info!(%user_id, session_number = session.session_number, "Session completed");
        Ok(session)
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Returns the student's view of a completed session's feedback,
    /// asking the evaluator on first call.
    pub async fn generate_feedback(
        &self,
        profile: &Profile,
        session_id: Uuid,
    ) -> Result<StudentFeedbackView> {
        let user_id = profile.user_id;
        let session = self.owned_session(user_id, session_id).await?;
        if !session.is_completed() {
            return Err(CoreError::forbidden("Feedback only after completion").into());
        }

        if let Some(existing) = self.store.feedback(session_id).await? {
            return Ok(existing.student_view());
        }

        let language = profile.preferred_language;
        let report = self
            .evaluate(&session, language)
            .await
            .map_err(|e| SimulationError::FeedbackUnavailable(e.to_string()))?;

        let feedback = report.into_feedback(session_id, user_id);
        match self.store.insert_feedback(&feedback).await {
            Ok(()) => {}
            // A concurrent request stored feedback first; serve that one.
            Err(CoreError::InvalidState(_)) => {
                if let Some(existing) = self.store.feedback(session_id).await? {
                    return Ok(existing.student_view());
                }
            }
            Err(e) => return Err(e.into()),
        }

        let awarded =
            award_skill_badges_if_ready(self.store.as_ref(), user_id, SKILL_BADGE_THRESHOLD).await?;
        tracing::info!(%user_id, %session_id, badges = ?awarded, "Feedback stored");
        Ok(feedback.student_view())
    }

    async fn evaluate(&self, session: &Session, language: Language) -> Result<FeedbackReport> {
        let history = self
            .store
            .recent_messages(session.id, EVALUATION_TURNS)
            .await?;
        let prompt = prompts::evaluation_prompt(session, language, &render_transcript(&history));
        let request = CompletionRequest::new(vec![Message::user(prompt)])
            .with_system_prompt(prompts::eval_system(language))
            .with_temperature(EVALUATOR_TEMPERATURE)
            .with_json_output();

        let response = self.evaluator.complete(request).await?;
        tracing::debug!(tokens = response.tokens_used.total(), "Evaluator replied");
        parse_feedback(&response.content, language)
    }

    // ========================================================================
    // Questionnaire
    // ========================================================================

    /// Stores the questionnaire answers of a session that has feedback.
    pub async fn submit_questionnaire(&self, answer: QuestionnaireAnswer) -> Result<()> {
        answer.validate()?;
        let feedback = self.store.feedback(answer.session_id).await?;
        if !feedback.is_some_and(|f| f.user_id == answer.user_id) {
            return Err(CoreError::forbidden("Questionnaire after feedback").into());
        }
        self.store.upsert_questionnaire(&answer).await?;
        Ok(())
    }
}

/// Parses an evaluator reply into a validated report.
///
/// Markdown fences and surrounding prose are ignored; the outermost JSON
/// object is used. A missing `language` falls back to `fallback`.
pub fn parse_feedback(reply: &str, fallback: Language) -> Result<FeedbackReport> {
    let object = extract_json_object(reply)
        .ok_or_else(|| LlmError::decode("no JSON object in evaluator reply"))?;
    let mut value: serde_json::Value =
        serde_json::from_str(object).map_err(|e| LlmError::decode(e.to_string()))?;
    if let Some(map) = value.as_object_mut() {
        map.entry("language").or_insert_with(|| serde_json::json!(fallback));
    }
    let report: FeedbackReport =
        serde_json::from_value(value).map_err(|e| LlmError::decode(e.to_string()))?;
    report.validate()?;
    Ok(report)
}
