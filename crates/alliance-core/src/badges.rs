//! Milestone and skill badges.

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::store::Store;
use crate::types::{Badge, SkillIndicators};

/// Badges awarded when a given session number is completed.
pub const MILESTONE_BADGES: [(u8, &str); 5] = [
    (1, "MILESTONE_SESSION_1"),
    (4, "MILESTONE_SESSION_4"),
    (8, "MILESTONE_SESSION_8"),
    (12, "MILESTONE_SESSION_12"),
    (16, "MILESTONE_SESSION_16"),
];

/// Badges awarded per skill indicator key.
pub const SKILL_BADGES: [(&str, &str); 5] = [
    ("active_listening", "SKILL_ACTIVE_LISTENING"),
    ("reformulation", "SKILL_REFORMULATION"),
    ("emotional_validation", "SKILL_EMOTIONAL_VALIDATION"),
    ("open_questions", "SKILL_OPEN_QUESTIONS"),
    ("structure_clarity", "SKILL_STRUCTURE_CLARITY"),
];

/// Number of evaluated sessions a skill must be observed in.
pub const SKILL_BADGE_THRESHOLD: usize = 3;

/// Milestone badge code for a session number, if any.
pub fn milestone_badge(session_number: u8) -> Option<&'static str> {
    MILESTONE_BADGES
        .iter()
        .find(|(n, _)| *n == session_number)
        .map(|(_, code)| *code)
}

/// Awards a badge; awarding one the student already holds is a no-op.
pub async fn award_badge(store: &dyn Store, user_id: Uuid, badge_code: &str) -> Result<bool> {
    let awarded = store
        .insert_badge_if_absent(&Badge::new(user_id, badge_code))
        .await?;
    if awarded {
        info!(%user_id, badge_code, "Awarded badge");
    }
    Ok(awarded)
}

/// Awards the milestone badge tied to a completed session, if any.
pub async fn award_milestone_badge(
    store: &dyn Store,
    user_id: Uuid,
    session_number: u8,
) -> Result<bool> {
    match milestone_badge(session_number) {
        Some(code) => award_badge(store, user_id, code).await,
        None => Ok(false),
    }
}

/// How many times each skill was observed, in [`SKILL_BADGES`] order.
pub fn skill_counts<'a>(
    indicators: impl IntoIterator<Item = &'a SkillIndicators>,
) -> [(&'static str, usize); 5] {
    let mut counts = SKILL_BADGES.map(|(key, _)| (key, 0));
    for indicators in indicators {
        for (slot, (_, observed)) in counts.iter_mut().zip(indicators.pairs()) {
            if observed {
                slot.1 += 1;
            }
        }
    }
    counts
}

/// Awards every skill badge whose skill was observed in at least
/// `threshold` of the student's evaluated sessions.
///
/// Returns the codes newly awarded.
pub async fn award_skill_badges_if_ready(
    store: &dyn Store,
    user_id: Uuid,
    threshold: usize,
) -> Result<Vec<&'static str>> {
    let feedback = store.feedback_for_user(user_id).await?;
    let counts = skill_counts(feedback.iter().map(|f| &f.skill_indicators));

    let mut awarded = Vec::new();
    for ((_, count), (_, code)) in counts.iter().zip(SKILL_BADGES) {
        if *count >= threshold && award_badge(store, user_id, code).await? {
            awarded.push(code);
        }
    }
    Ok(awarded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{
        FeedbackReport, InternalScores, Kpis, Language, StudentFacingFeedback,
    };

    fn feedback_with(user_id: Uuid, skills: SkillIndicators) -> crate::types::Feedback {
        FeedbackReport {
            language: Language::Fr,
            student_facing: StudentFacingFeedback {
                strengths: vec!["a".into(), "b".into(), "c".into()],
                areas_to_improve: vec!["d".into(), "e".into(), "f".into()],
                reflective_question: "Qu'en pensez-vous ?".into(),
            },
            internal_scores: InternalScores {
                empathy: 3,
                structure: 3,
                alliance: 3,
            },
            skill_indicators: skills,
            kpis: Kpis::new(),
        }
        .into_feedback(Uuid::new_v4(), user_id)
    }

    #[test]
    fn test_milestone_lookup() {
        assert_eq!(milestone_badge(1), Some("MILESTONE_SESSION_1"));
        assert_eq!(milestone_badge(16), Some("MILESTONE_SESSION_16"));
        assert_eq!(milestone_badge(2), None);
    }

    #[tokio::test]
    async fn test_award_badge_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert!(award_milestone_badge(&store, user, 4).await.unwrap());
        assert!(!award_milestone_badge(&store, user, 4).await.unwrap());
        assert!(!award_milestone_badge(&store, user, 5).await.unwrap());
        assert_eq!(store.badges(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skill_badges_need_threshold() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let listening = SkillIndicators {
            active_listening: true,
            ..SkillIndicators::default()
        };
        let both = SkillIndicators {
            active_listening: true,
            open_questions: true,
            ..SkillIndicators::default()
        };

        store.insert_feedback(&feedback_with(user, listening)).await.unwrap();
        store.insert_feedback(&feedback_with(user, both)).await.unwrap();
        assert!(award_skill_badges_if_ready(&store, user, 3)
            .await
            .unwrap()
            .is_empty());

        store.insert_feedback(&feedback_with(user, both)).await.unwrap();
        let awarded = award_skill_badges_if_ready(&store, user, 3).await.unwrap();
        assert_eq!(awarded, vec!["SKILL_ACTIVE_LISTENING"]);

        // Another student's feedback does not count.
        store
            .insert_feedback(&feedback_with(Uuid::new_v4(), both))
            .await
            .unwrap();
        assert!(award_skill_badges_if_ready(&store, user, 3)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_skill_counts() {
        let a = SkillIndicators {
            reformulation: true,
            structure_clarity: true,
            ..SkillIndicators::default()
        };
        let b = SkillIndicators {
            reformulation: true,
            ..SkillIndicators::default()
        };
        let counts = skill_counts([&a, &b]);
        assert_eq!(counts[1], ("reformulation", 2));
        assert_eq!(counts[4], ("structure_clarity", 1));
        assert_eq!(counts[0], ("active_listening", 0));
    }
}
