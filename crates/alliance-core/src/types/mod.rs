//! Domain types for the simulator.

mod badge;
mod enums;
mod feedback;
mod message;
mod profile;
mod session;

pub use badge::Badge;
pub use enums::{
    Difficulty, Gender, Language, Level, MessageRole, Reorientation, Role, SessionStatus,
};
pub use feedback::{
    Feedback, FeedbackReport, InternalScores, Kpis, QuestionnaireAnswer, SkillIndicators,
    StudentFacingFeedback, StudentFeedbackView,
};
pub use message::{render_transcript, Message, NewMessage};
pub use profile::{Profile, ProfilePreferences};
pub use session::{Session, StudentProgram, SESSIONS_PER_PROGRAM};
