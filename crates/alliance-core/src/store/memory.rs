//! In-process [`Store`] backed by hash maps.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::{Error, Result};
use crate::types::{
    Badge, Feedback, Message, NewMessage, Profile, ProfilePreferences, QuestionnaireAnswer, Role,
    Session, SessionStatus, StudentProgram,
};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    programs: HashMap<Uuid, StudentProgram>,
    sessions: HashMap<Uuid, Session>,
    messages: HashMap<Uuid, Vec<Message>>,
    feedback: HashMap<Uuid, Feedback>,
    badges: Vec<Badge>,
    questionnaire: HashMap<Uuid, QuestionnaireAnswer>,
}

/// A [`Store`] that keeps everything in memory.
///
/// All tables sit behind a single lock, so every operation is atomic with
/// respect to the others. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<usize> {
        Ok(self.tables.read().await.profiles.len().min(1))
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        self.tables
            .write()
            .await
            .profiles
            .entry(profile.user_id)
            .or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn upsert_preferences(&self, user_id: Uuid, prefs: ProfilePreferences) -> Result<()> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::new_student(user_id, None));
        profile.level = prefs.level;
        profile.preferred_language = prefs.preferred_language;
        Ok(())
    }

    async fn profiles(&self, role: Option<Role>) -> Result<Vec<Profile>> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| role.is_none_or(|r| p.role == r))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn count_profiles(&self, role: Role) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().filter(|p| p.role == role).count() as u64)
    }

    async fn program(&self, user_id: Uuid) -> Result<Option<StudentProgram>> {
        Ok(self.tables.read().await.programs.get(&user_id).cloned())
    }

    async fn insert_program(&self, program: &StudentProgram) -> Result<()> {
        self.tables
            .write()
            .await
            .programs
            .entry(program.user_id)
            .or_insert_with(|| program.clone());
        Ok(())
    }

    async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        Ok(sessions)
    }

    async fn all_sessions(&self) -> Result<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables.sessions.values().cloned().collect();
        sessions.sort_by_key(|s| (s.user_id, s.session_number));
        Ok(sessions)
    }

    async fn count_sessions(&self, status: SessionStatus) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.values().filter(|s| s.status == status).count() as u64)
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(&session_id).cloned())
    }

    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for session in sessions {
            let clash = tables.sessions.values().any(|s| {
                s.user_id == session.user_id && s.session_number == session.session_number
            });
            if !clash {
                tables.sessions.insert(session.id, session.clone());
            }
        }
        Ok(())
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| Error::not_found("Session not found"))?;
        stored.status = session.status;
        stored.started_at = session.started_at;
        stored.ended_at = session.ended_at;
        Ok(())
    }

    async fn unlock_session(&self, user_id: Uuid, session_number: u8) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let target = tables.sessions.values_mut().find(|s| {
            s.user_id == user_id
                && s.session_number == session_number
                && s.status == SessionStatus::Locked
        });
        Ok(match target {
            Some(session) => {
                session.status = SessionStatus::Available;
                true
            }
            None => false,
        })
    }

    async fn transcript(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(&session_id).cloned().unwrap_or_default())
    }

    async fn recent_messages(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        let messages = tables
            .messages
            .get(&session_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages[skip..].to_vec())
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message> {
        let mut tables = self.tables.write().await;
        let transcript = tables.messages.entry(message.session_id).or_default();
        let turn_index = crate::program::next_turn_index(transcript.last().map(|m| m.turn_index));
        let message = message.at_turn(turn_index);
        transcript.push(message.clone());
        Ok(message)
    }

    async fn feedback(&self, session_id: Uuid) -> Result<Option<Feedback>> {
        Ok(self.tables.read().await.feedback.get(&session_id).cloned())
    }

    async fn feedback_for_user(&self, user_id: Uuid) -> Result<Vec<Feedback>> {
        let tables = self.tables.read().await;
        let mut feedback: Vec<Feedback> = tables
            .feedback
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        feedback.sort_by_key(|f| f.created_at);
        Ok(feedback)
    }

    async fn all_feedback(&self) -> Result<Vec<Feedback>> {
        let tables = self.tables.read().await;
        let mut feedback: Vec<Feedback> = tables.feedback.values().cloned().collect();
        feedback.sort_by_key(|f| f.created_at);
        Ok(feedback)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.feedback.contains_key(&feedback.session_id) {
            return Err(Error::invalid_state(
                "Feedback already exists for this session",
            ));
        }
        tables.feedback.insert(feedback.session_id, feedback.clone());
        Ok(())
    }

    async fn badges(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        let tables = self.tables.read().await;
        Ok(tables
            .badges
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_badge_if_absent(&self, badge: &Badge) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let held = tables
            .badges
            .iter()
            .any(|b| b.user_id == badge.user_id && b.badge_code == badge.badge_code);
        if held {
            return Ok(false);
        }
        tables.badges.push(badge.clone());
        Ok(true)
    }

    async fn upsert_questionnaire(&self, answer: &QuestionnaireAnswer) -> Result<()> {
        self.tables
            .write()
            .await
            .questionnaire
            .insert(answer.session_id, answer.clone());
        Ok(())
    }

    async fn questionnaire(&self, session_id: Uuid) -> Result<Option<QuestionnaireAnswer>> {
        Ok(self
            .tables
            .read()
            .await
            .questionnaire
            .get(&session_id)
            .cloned())
    }
}
