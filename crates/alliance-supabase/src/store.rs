//! [`Store`] implementation over Supabase PostgREST tables.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use alliance_core::program::next_turn_index;
use alliance_core::{
    Badge, Error, Feedback, Message, NewMessage, Profile, ProfilePreferences, QuestionnaireAnswer,
    Result, Role, Session, SessionStatus, Store, StudentProgram,
};

use crate::rest::PostgrestClient;

/// Attempts at claiming a turn index before giving up.
const APPEND_ATTEMPTS: usize = 3;

mod tables {
    pub const PROFILES: &str = "profiles";
    pub const PROGRAMS: &str = "student_program";
    pub const SESSIONS: &str = "sessions";
    pub const MESSAGES: &str = "messages";
    pub const FEEDBACK: &str = "feedback";
    pub const BADGES: &str = "badges";
    pub const QUESTIONNAIRE: &str = "questionnaire";
}

#[derive(Debug, Deserialize)]
struct TurnRow {
    turn_index: u32,
}

/// Supabase-backed [`Store`].
///
/// Expects the tables `profiles`, `student_program`, `sessions`,
/// `messages`, `feedback`, `badges` and `questionnaire`, with unique keys on
/// `sessions(user_id, session_number)` and `messages(session_id, turn_index)`.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: PostgrestClient,
}

impl PostgrestStore {
    /// Wraps a PostgREST client.
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    /// Connects with a project URL and service-role key.
    pub fn connect(base_url: &str, service_key: &str) -> crate::Result<Self> {
        Ok(Self::new(PostgrestClient::new(base_url, service_key)?))
    }

    async fn last_turn(&self, session_id: Uuid) -> Result<Option<u32>> {
        let row: Option<TurnRow> = self
            .client
            .from(tables::MESSAGES)
            .select("turn_index")
            .eq("session_id", session_id)
            .order("turn_index", false)
            .fetch_first()
            .await?;
        Ok(row.map(|r| r.turn_index))
    }
}

#[async_trait]
impl Store for PostgrestStore {
    async fn ping(&self) -> Result<usize> {
        let rows: Vec<serde_json::Value> = self
            .client
            .from(tables::PROFILES)
            .select("user_id")
            .limit(1)
            .fetch()
            .await?;
        Ok(rows.len())
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self
            .client
            .from(tables::PROFILES)
            .eq("user_id", user_id)
            .fetch_first()
            .await?)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        self.client
            .from(tables::PROFILES)
            .insert_ignoring_duplicates(profile, "user_id")
            .await?;
        Ok(())
    }

    async fn upsert_preferences(&self, user_id: Uuid, prefs: ProfilePreferences) -> Result<()> {
        let row = json!({
            "user_id": user_id,
            "level": prefs.level,
            "preferred_language": prefs.preferred_language,
        });
        self.client
            .from(tables::PROFILES)
            .upsert(&row, "user_id")
            .await?;
        Ok(())
    }

    async fn profiles(&self, role: Option<Role>) -> Result<Vec<Profile>> {
        let mut query = self.client.from(tables::PROFILES);
        if let Some(role) = role {
            query = query.eq("role", role);
        }
        Ok(query.order("created_at", false).fetch().await?)
    }

    async fn count_profiles(&self, role: Role) -> Result<u64> {
        Ok(self
            .client
            .from(tables::PROFILES)
            .select("user_id")
            .eq("role", role)
            .count()
            .await?)
    }

    async fn program(&self, user_id: Uuid) -> Result<Option<StudentProgram>> {
        Ok(self
            .client
            .from(tables::PROGRAMS)
            .eq("user_id", user_id)
            .fetch_first()
            .await?)
    }

    async fn insert_program(&self, program: &StudentProgram) -> Result<()> {
        self.client
            .from(tables::PROGRAMS)
            .insert_ignoring_duplicates(program, "user_id")
            .await?;
        Ok(())
    }

    async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        Ok(self
            .client
            .from(tables::SESSIONS)
            .eq("user_id", user_id)
            .order("session_number", true)
            .fetch()
            .await?)
    }

    async fn all_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.client.from(tables::SESSIONS).fetch().await?)
    }

    async fn count_sessions(&self, status: SessionStatus) -> Result<u64> {
        Ok(self
            .client
            .from(tables::SESSIONS)
            .select("id")
            .eq("status", status)
            .count()
            .await?)
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>> {
        Ok(self
            .client
            .from(tables::SESSIONS)
            .eq("id", session_id)
            .fetch_first()
            .await?)
    }

    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()> {
        if sessions.is_empty() {
            return Ok(());
        }
        let inserted = self
            .client
            .from(tables::SESSIONS)
            .insert_ignoring_duplicates(sessions, "user_id,session_number")
            .await?;
        tracing::debug!(requested = sessions.len(), inserted, "Inserted sessions");
        Ok(())
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        let patch = json!({
            "status": session.status,
            "started_at": session.started_at,
            "ended_at": session.ended_at,
        });
        let updated = self
            .client
            .from(tables::SESSIONS)
            .eq("id", session.id)
            .update(&patch)
            .await?;
        if updated == 0 {
            return Err(Error::not_found("Session not found"));
        }
        Ok(())
    }

    async fn unlock_session(&self, user_id: Uuid, session_number: u8) -> Result<bool> {
        let updated = self
            .client
            .from(tables::SESSIONS)
            .eq("user_id", user_id)
            .eq("session_number", session_number)
            .eq("status", SessionStatus::Locked)
            .update(&json!({ "status": SessionStatus::Available }))
            .await?;
        Ok(updated > 0)
    }

    async fn transcript(&self, session_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .client
            .from(tables::MESSAGES)
            .eq("session_id", session_id)
            .order("turn_index", true)
            .fetch()
            .await?)
    }

    async fn recent_messages(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>> {
        let mut rows: Vec<Message> = self
            .client
            .from(tables::MESSAGES)
            .eq("session_id", session_id)
            .order("turn_index", false)
            .limit(limit)
            .fetch()
            .await?;
        rows.reverse();
        Ok(rows)
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message> {
        let mut last_error = None;
        for _ in 0..APPEND_ATTEMPTS {
            let turn_index = next_turn_index(self.last_turn(message.session_id).await?);
            let row = message.clone().at_turn(turn_index);
            match self.client.from(tables::MESSAGES).insert(&row).await {
                Ok(()) => return Ok(row),
                // Another writer took this turn; read the new tail and retry.
                Err(e) if e.is_conflict() => {
                    tracing::debug!(session_id = %message.session_id, turn_index, "Turn index taken");
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_error
            .map(Error::from)
            .unwrap_or_else(|| Error::store("message append failed")))
    }

    async fn feedback(&self, session_id: Uuid) -> Result<Option<Feedback>> {
        Ok(self
            .client
            .from(tables::FEEDBACK)
            .eq("session_id", session_id)
            .fetch_first()
            .await?)
    }

    async fn feedback_for_user(&self, user_id: Uuid) -> Result<Vec<Feedback>> {
        Ok(self
            .client
            .from(tables::FEEDBACK)
            .eq("user_id", user_id)
            .fetch()
            .await?)
    }

    async fn all_feedback(&self) -> Result<Vec<Feedback>> {
        Ok(self.client.from(tables::FEEDBACK).fetch().await?)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<()> {
        match self.client.from(tables::FEEDBACK).insert(feedback).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => Err(Error::invalid_state(
                "Feedback already exists for this session",
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn badges(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        Ok(self
            .client
            .from(tables::BADGES)
            .select("user_id,badge_code")
            .eq("user_id", user_id)
            .fetch()
            .await?)
    }

    async fn insert_badge_if_absent(&self, badge: &Badge) -> Result<bool> {
        let existing: Option<serde_json::Value> = self
            .client
            .from(tables::BADGES)
            .select("badge_code")
            .eq("user_id", badge.user_id)
            .eq("badge_code", &badge.badge_code)
            .fetch_first()
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let row = json!({ "user_id": badge.user_id, "badge_code": badge.badge_code });
        match self.client.from(tables::BADGES).insert(&row).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_questionnaire(&self, answer: &QuestionnaireAnswer) -> Result<()> {
        self.client
            .from(tables::QUESTIONNAIRE)
            .upsert(answer, "session_id")
            .await?;
        Ok(())
    }

    async fn questionnaire(&self, session_id: Uuid) -> Result<Option<QuestionnaireAnswer>> {
        Ok(self
            .client
            .from(tables::QUESTIONNAIRE)
            .eq("session_id", session_id)
            .fetch_first()
            .await?)
    }
}
