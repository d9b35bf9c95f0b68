//! Aggregate score averages for administrators.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::types::{Feedback, InternalScores, Level, Profile, Session};

/// Mean of each internal score; `None` when there were no samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreAverages {
    /// Mean empathy score
    pub empathy: Option<f64>,
    /// Mean structure score
    pub structure: Option<f64>,
    /// Mean alliance score
    pub alliance: Option<f64>,
}

/// Averages across every evaluated session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    /// All feedback together
    pub overall_avg: ScoreAverages,
    /// Keyed by academic year (`4e`, `5e`, `autre`)
    pub by_level_avg: BTreeMap<String, ScoreAverages>,
    /// Keyed by session number
    pub by_session_number_avg: BTreeMap<u8, ScoreAverages>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sums: [u32; 3],
    samples: u32,
}

impl Accumulator {
    fn add(&mut self, scores: &InternalScores) {
        for (sum, (_, value)) in self.sums.iter_mut().zip(scores.pairs()) {
            *sum += u32::from(value);
        }
        self.samples += 1;
    }

    fn finish(&self) -> ScoreAverages {
        let mean = |sum: u32| (self.samples > 0).then(|| f64::from(sum) / f64::from(self.samples));
        ScoreAverages {
            empathy: mean(self.sums[0]),
            structure: mean(self.sums[1]),
            alliance: mean(self.sums[2]),
        }
    }
}

/// Computes overall, per-level and per-session averages.
///
/// Students without a profile count as `autre`. Feedback whose session is
/// unknown only contributes to the overall and per-level views.
pub fn summarize(feedback: &[Feedback], sessions: &[Session], profiles: &[Profile]) -> AnalyticsSummary {
    let session_numbers: HashMap<Uuid, u8> =
        sessions.iter().map(|s| (s.id, s.session_number)).collect();
    let levels: HashMap<Uuid, Level> = profiles.iter().map(|p| (p.user_id, p.level)).collect();

    let mut overall = Accumulator::default();
    let mut by_level: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut by_session: BTreeMap<u8, Accumulator> = BTreeMap::new();

    for f in feedback {
        overall.add(&f.internal_scores);

        let level = levels.get(&f.user_id).copied().unwrap_or(Level::Other);
        by_level
            .entry(level.as_str().to_string())
            .or_default()
            .add(&f.internal_scores);

        if let Some(number) = session_numbers.get(&f.session_id) {
            by_session
                .entry(*number)
                .or_default()
                .add(&f.internal_scores);
        }
    }

    AnalyticsSummary {
        overall_avg: overall.finish(),
        by_level_avg: by_level.into_iter().map(|(k, v)| (k, v.finish())).collect(),
        by_session_number_avg: by_session
            .into_iter()
            .map(|(k, v)| (k, v.finish()))
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::program::{plan_program, plan_sessions};
    use crate::types::{FeedbackReport, Kpis, Language, SkillIndicators, StudentFacingFeedback};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn feedback(session: &Session, empathy: u8, structure: u8, alliance: u8) -> Feedback {
        FeedbackReport {
            language: Language::Fr,
            student_facing: StudentFacingFeedback {
                strengths: vec![],
                areas_to_improve: vec![],
                reflective_question: String::new(),
            },
            internal_scores: InternalScores {
                empathy,
                structure,
                alliance,
            },
            skill_indicators: SkillIndicators::default(),
            kpis: Kpis::new(),
        }
        .into_feedback(session.id, session.user_id)
    }

    fn sessions_for(user: Uuid) -> Vec<Session> {
        let mut rng = StdRng::seed_from_u64(2);
        let program = plan_program(user, &mut rng);
        plan_sessions(user, &program, &[], &mut rng)
    }

    #[test]
    fn test_empty_summary_has_null_averages() {
        let summary = summarize(&[], &[], &[]);
        assert_eq!(summary.overall_avg, ScoreAverages::default());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["overall_avg"]["empathy"].is_null());
        assert!(json["by_level_avg"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_summary_groups_by_level_and_session() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_profile = Profile::new_student(alice, None);
        alice_profile.level = Level::Fourth;

        let alice_sessions = sessions_for(alice);
        let bob_sessions = sessions_for(bob);
        let feedback = vec![
            feedback(&alice_sessions[0], 4, 2, 5),
            feedback(&alice_sessions[1], 2, 4, 3),
            feedback(&bob_sessions[0], 3, 3, 1),
        ];
        let sessions: Vec<Session> = alice_sessions.into_iter().chain(bob_sessions).collect();

        let summary = summarize(&feedback, &sessions, &[alice_profile]);

        assert_eq!(summary.overall_avg.empathy, Some(3.0));
        assert_eq!(summary.overall_avg.alliance, Some(3.0));
        assert_eq!(summary.by_level_avg["4e"].structure, Some(3.0));
        assert_eq!(summary.by_level_avg["autre"].alliance, Some(1.0));
        assert_eq!(summary.by_session_number_avg[&1].empathy, Some(3.5));
        assert_eq!(summary.by_session_number_avg[&2].alliance, Some(3.0));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_session_number_avg"]["1"]["empathy"], 3.5);
    }
}
