//! Transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MessageRole;

/// One turn of a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Session the message belongs to
    pub session_id: Uuid,

    /// Owning student
    pub user_id: Uuid,

    /// 1-based position in the transcript
    pub turn_index: u32,

    /// Author
    pub role: MessageRole,

    /// Text of the turn
    pub content: String,

    /// Insertion timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A message about to be appended; the store assigns `turn_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Session the message belongs to
    pub session_id: Uuid,

    /// Owning student
    pub user_id: Uuid,

    /// Author
    pub role: MessageRole,

    /// Text of the turn
    pub content: String,
}

impl NewMessage {
    /// A message written by the student.
    pub fn student(session_id: Uuid, user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            session_id,
            user_id,
            role: MessageRole::Student,
            content: content.into(),
        }
    }

    /// A message spoken by the simulated patient.
    pub fn patient(session_id: Uuid, user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            session_id,
            user_id,
            role: MessageRole::Patient,
            content: content.into(),
        }
    }

    /// Materializes the message at a given turn.
    pub fn at_turn(self, turn_index: u32) -> Message {
        Message {
            session_id: self.session_id,
            user_id: self.user_id,
            turn_index,
            role: self.role,
            content: self.content,
            created_at: Utc::now(),
        }
    }
}

/// Renders messages as `ROLE: content` lines, the format the LLM prompts use.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
