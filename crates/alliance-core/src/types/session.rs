//! Simulated sessions and the per-student program.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Difficulty, Gender, Reorientation, SessionStatus};

/// Number of sessions in a student's program.
pub const SESSIONS_PER_PROGRAM: u8 = 16;

/// One simulated patient interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: Uuid,

    /// Owning student
    pub user_id: Uuid,

    /// Position in the program, 1..=16
    pub session_number: u8,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Hidden difficulty of the patient
    pub difficulty: Difficulty,

    /// Referral scenario
    pub reorientation: Reorientation,

    /// Age of the simulated patient
    pub patient_age: u8,

    /// Gender of the simulated patient
    pub patient_gender: Gender,

    /// Whether the patient speaks first
    #[serde(default)]
    pub patient_opening_starts: bool,

    /// When the first student message was sent
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the student ended the session
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns `true` once the student has ended the session.
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Referral plan drawn once per student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProgram {
    /// Owning student
    pub user_id: Uuid,

    /// Sessions whose patient needs immediate referral
    pub reorientation_immediate_sessions: Vec<u8>,

    /// Sessions whose patient needs delayed referral
    pub reorientation_delayed_sessions: Vec<u8>,
}

impl StudentProgram {
    /// Referral scenario for a session number.
    pub fn reorientation_for(&self, session_number: u8) -> Reorientation {
        if self.reorientation_immediate_sessions.contains(&session_number) {
            Reorientation::Immediate
        } else if self.reorientation_delayed_sessions.contains(&session_number) {
            Reorientation::Delayed
        } else {
            Reorientation::None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reorientation_lookup() {
        let program = StudentProgram {
            user_id: Uuid::new_v4(),
            reorientation_immediate_sessions: vec![3, 9],
            reorientation_delayed_sessions: vec![5, 14],
        };
        assert_eq!(program.reorientation_for(3), Reorientation::Immediate);
        assert_eq!(program.reorientation_for(14), Reorientation::Delayed);
        assert_eq!(program.reorientation_for(1), Reorientation::None);
    }

    #[test]
    fn test_session_row_deserializes_nullable_timestamps() {
        let json = r#"{
            "id": "0e7f1f7c-8a55-4f3e-9d2b-5f6b2a1d3c4e",
            "user_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            "session_number": 2,
            "status": "locked",
            "difficulty": "L3",
            "reorientation": "none",
            "patient_age": 41,
            "patient_gender": "male",
            "patient_opening_starts": true,
            "started_at": null,
            "ended_at": null
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.session_number, 2);
        assert_eq!(session.status, SessionStatus::Locked);
        assert!(session.started_at.is_none());
        assert!(!session.is_completed());
    }
}
