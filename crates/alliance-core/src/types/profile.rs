//! Student and administrator profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Language, Level, Role};

/// Account profile, keyed by the identity provider's user ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity-provider subject (UUID)
    pub user_id: Uuid,

    /// Login email, when the identity provider shares it
    #[serde(default)]
    pub email: Option<String>,

    /// Account role
    #[serde(default)]
    pub role: Role,

    /// Academic year
    #[serde(default)]
    pub level: Level,

    /// Language used for the simulated patient and the evaluation
    #[serde(default)]
    pub preferred_language: Language,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Builds the profile given to a user on first sign-in.
    pub fn new_student(user_id: Uuid, email: Option<String>) -> Self {
        Self {
            user_id,
            email,
            role: Role::Student,
            level: Level::Other,
            preferred_language: Language::Fr,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` for administrator accounts.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Self-service profile settings chosen at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePreferences {
    /// Academic year
    pub level: Level,

    /// Preferred language, French unless stated otherwise
    #[serde(default)]
    pub preferred_language: Language,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_student_defaults() {
        let id = Uuid::new_v4();
        let profile = Profile::new_student(id, Some("a@b.fr".to_string()));
        assert_eq!(profile.user_id, id);
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.level, Level::Other);
        assert_eq!(profile.preferred_language, Language::Fr);
        assert!(!profile.is_admin());
    }

    #[test]
    fn test_preferences_language_defaults_to_french() {
        let prefs: ProfilePreferences = serde_json::from_str(r#"{"level":"5e"}"#).unwrap();
        assert_eq!(prefs.level, Level::Fifth);
        assert_eq!(prefs.preferred_language, Language::Fr);
    }

    #[test]
    fn test_profile_tolerates_missing_columns() {
        let json = r#"{"user_id":"1b4e28ba-2fa1-11d2-883f-0016d3cca427","created_at":"2026-01-05T10:00:00+00:00"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.email, None);
        assert_eq!(profile.role, Role::Student);
    }
}
