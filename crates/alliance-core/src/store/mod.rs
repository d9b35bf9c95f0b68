//! Persistence boundary.
//!
//! [`Store`] is the only way the rest of the workspace reads or writes
//! simulator data. It is object-safe and shared as `Arc<dyn Store>`.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process maps, for tests and the `memory` backend
//! - `alliance_supabase::PostgrestStore`: Supabase PostgREST tables

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    Badge, Feedback, Message, NewMessage, Profile, ProfilePreferences, QuestionnaireAnswer, Role,
    Session, SessionStatus, StudentProgram,
};

/// Async storage for every simulator table.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Cheap connectivity check: reads at most one profile row and returns
    /// how many came back (0 or 1).
    async fn ping(&self) -> Result<usize>;

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Fetches a profile.
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    /// Inserts a profile; an existing profile for the same user is kept.
    async fn insert_profile(&self, profile: &Profile) -> Result<()>;

    /// Sets level and language, creating a student profile if needed.
    async fn upsert_preferences(&self, user_id: Uuid, prefs: ProfilePreferences) -> Result<()>;

    /// Lists profiles, optionally filtered by role, newest first.
    async fn profiles(&self, role: Option<Role>) -> Result<Vec<Profile>>;

    /// Counts profiles with a role.
    async fn count_profiles(&self, role: Role) -> Result<u64>;

    // ------------------------------------------------------------------
    // Programs
    // ------------------------------------------------------------------

    /// Fetches the referral plan of a student.
    async fn program(&self, user_id: Uuid) -> Result<Option<StudentProgram>>;

    /// Stores a referral plan; an existing plan is kept.
    async fn insert_program(&self, program: &StudentProgram) -> Result<()>;

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Lists a student's sessions ordered by session number.
    async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>>;

    /// Lists every session.
    async fn all_sessions(&self) -> Result<Vec<Session>>;

    /// Counts sessions in a status, across all students.
    async fn count_sessions(&self, status: SessionStatus) -> Result<u64>;

    /// Fetches a session by ID.
    async fn session(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Inserts sessions; rows clashing on `(user_id, session_number)` are skipped.
    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()>;

    /// Persists status and timestamps of an existing session.
    async fn update_session(&self, session: &Session) -> Result<()>;

    /// Moves a session from `locked` to `available`.
    ///
    /// Returns `false` when the session does not exist or was not locked.
    async fn unlock_session(&self, user_id: Uuid, session_number: u8) -> Result<bool>;

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Full transcript in turn order.
    async fn transcript(&self, session_id: Uuid) -> Result<Vec<Message>>;

    /// The last `limit` turns, in turn order.
    async fn recent_messages(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>>;

    /// Appends a message at the next turn index and returns it.
    async fn append_message(&self, message: NewMessage) -> Result<Message>;

    // ------------------------------------------------------------------
    // Feedback
    // ------------------------------------------------------------------

    /// Fetches the feedback of a session.
    async fn feedback(&self, session_id: Uuid) -> Result<Option<Feedback>>;

    /// Lists a student's feedback.
    async fn feedback_for_user(&self, user_id: Uuid) -> Result<Vec<Feedback>>;

    /// Lists every feedback row.
    async fn all_feedback(&self) -> Result<Vec<Feedback>>;

    /// Inserts feedback; fails if the session already has some.
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<()>;

    // ------------------------------------------------------------------
    // Badges
    // ------------------------------------------------------------------

    /// Lists a student's badges.
    async fn badges(&self, user_id: Uuid) -> Result<Vec<Badge>>;

    /// Inserts a badge unless the student already holds it.
    ///
    /// Returns `true` when the badge was newly awarded.
    async fn insert_badge_if_absent(&self, badge: &Badge) -> Result<bool>;

    // ------------------------------------------------------------------
    // Questionnaire
    // ------------------------------------------------------------------

    /// Inserts or replaces the answers for a session.
    async fn upsert_questionnaire(&self, answer: &QuestionnaireAnswer) -> Result<()>;

    /// Fetches the answers for a session.
    async fn questionnaire(&self, session_id: Uuid) -> Result<Option<QuestionnaireAnswer>>;
}
