//! Earned badges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A badge earned by a student. `(user_id, badge_code)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Owning student
    pub user_id: Uuid,

    /// Stable badge code, e.g. `MILESTONE_SESSION_4`
    pub badge_code: String,

    /// When the badge was awarded
    #[serde(default = "Utc::now", alias = "created_at")]
    pub awarded_at: DateTime<Utc>,
}

impl Badge {
    /// A badge awarded now.
    pub fn new(user_id: Uuid, badge_code: impl Into<String>) -> Self {
        Self {
            user_id,
            badge_code: badge_code.into(),
            awarded_at: Utc::now(),
        }
    }
}
