//! Evaluation feedback and the post-feedback questionnaire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Language;
use crate::error::{Error, Result};

/// Free-form KPI object produced by the evaluator.
pub type Kpis = serde_json::Map<String, serde_json::Value>;

/// Inclusive bounds on the number of strengths / improvement items.
const FEEDBACK_ITEMS: std::ops::RangeInclusive<usize> = 3..=5;

/// Inclusive bounds on the reflective question length, in characters.
const REFLECTIVE_QUESTION_CHARS: std::ops::RangeInclusive<usize> = 10..=400;

/// Inclusive bounds on each internal score.
const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Part of the feedback shown to the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFacingFeedback {
    /// 3 to 5 observable strengths
    pub strengths: Vec<String>,

    /// 3 to 5 actionable suggestions
    pub areas_to_improve: Vec<String>,

    /// One supportive question, 10 to 400 characters
    pub reflective_question: String,
}

impl StudentFacingFeedback {
    /// Checks item counts and question length.
    pub fn validate(&self) -> Result<()> {
        if !FEEDBACK_ITEMS.contains(&self.strengths.len()) {
            return Err(Error::validation_field(
                "student_facing.strengths",
                format!("expected 3 to 5 items, got {}", self.strengths.len()),
            ));
        }
        if !FEEDBACK_ITEMS.contains(&self.areas_to_improve.len()) {
            return Err(Error::validation_field(
                "student_facing.areas_to_improve",
                format!("expected 3 to 5 items, got {}", self.areas_to_improve.len()),
            ));
        }
        let chars = self.reflective_question.chars().count();
        if !REFLECTIVE_QUESTION_CHARS.contains(&chars) {
            return Err(Error::validation_field(
                "student_facing.reflective_question",
                format!("expected 10 to 400 characters, got {chars}"),
            ));
        }
        Ok(())
    }
}

/// Relational scores, each 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalScores {
    /// Empathy shown to the patient
    pub empathy: u8,

    /// Structure of the interview
    pub structure: u8,

    /// Therapeutic alliance
    pub alliance: u8,
}

impl InternalScores {
    /// Scores paired with their names, in report order.
    pub fn pairs(&self) -> [(&'static str, u8); 3] {
        [
            ("empathy", self.empathy),
            ("structure", self.structure),
            ("alliance", self.alliance),
        ]
    }

    /// Checks that every score is within 1..=5.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.pairs() {
            if !SCORE_RANGE.contains(&value) {
                return Err(Error::validation_field(
                    format!("internal_scores.{name}"),
                    format!("expected 1 to 5, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Observed communication skills.
///
/// Keys missing from stored rows deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillIndicators {
    /// Active listening
    pub active_listening: bool,

    /// Reformulation of the patient's words
    pub reformulation: bool,

    /// Validation of the patient's emotions
    pub emotional_validation: bool,

    /// Use of open questions
    pub open_questions: bool,

    /// Clear interview structure
    pub structure_clarity: bool,
}

impl SkillIndicators {
    /// Skill flags paired with their keys, in report order.
    pub fn pairs(&self) -> [(&'static str, bool); 5] {
        [
            ("active_listening", self.active_listening),
            ("reformulation", self.reformulation),
            ("emotional_validation", self.emotional_validation),
            ("open_questions", self.open_questions),
            ("structure_clarity", self.structure_clarity),
        ]
    }
}

/// The full evaluation, as produced by the evaluator and shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    /// Language the feedback is written in
    pub language: Language,

    /// Student-visible part
    pub student_facing: StudentFacingFeedback,

    /// Relational scores
    pub internal_scores: InternalScores,

    /// Observed skills
    #[serde(default)]
    pub skill_indicators: SkillIndicators,

    /// Free-form KPIs
    #[serde(default)]
    pub kpis: Kpis,
}

impl FeedbackReport {
    /// Checks every structural constraint of the report.
    pub fn validate(&self) -> Result<()> {
        self.student_facing.validate()?;
        self.internal_scores.validate()
    }

    /// Attaches the report to a session.
    pub fn into_feedback(self, session_id: Uuid, user_id: Uuid) -> Feedback {
        Feedback {
            session_id,
            user_id,
            language: self.language,
            student_facing: self.student_facing,
            internal_scores: self.internal_scores,
            skill_indicators: self.skill_indicators,
            kpis: self.kpis,
            created_at: Utc::now(),
        }
    }
}

/// Stored feedback, one per completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Evaluated session
    pub session_id: Uuid,

    /// Owning student
    pub user_id: Uuid,

    /// Language the feedback is written in
    #[serde(default)]
    pub language: Language,

    /// Student-visible part
    pub student_facing: StudentFacingFeedback,

    /// Relational scores
    pub internal_scores: InternalScores,

    /// Observed skills
    #[serde(default)]
    pub skill_indicators: SkillIndicators,

    /// Free-form KPIs
    #[serde(default)]
    pub kpis: Kpis,

    /// Insertion timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// The view returned to the student: no skill indicators, no KPIs.
    pub fn student_view(&self) -> StudentFeedbackView {
        StudentFeedbackView {
            language: self.language,
            student_facing: self.student_facing.clone(),
            internal_scores: self.internal_scores,
        }
    }

    /// The full view returned to administrators.
    pub fn admin_view(&self) -> FeedbackReport {
        FeedbackReport {
            language: self.language,
            student_facing: self.student_facing.clone(),
            internal_scores: self.internal_scores,
            skill_indicators: self.skill_indicators,
            kpis: self.kpis.clone(),
        }
    }
}

/// Student-safe feedback; scores are presented as indicators, not grades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFeedbackView {
    /// Language the feedback is written in
    pub language: Language,

    /// Student-visible part
    pub student_facing: StudentFacingFeedback,

    /// Relational scores
    pub internal_scores: InternalScores,
}

/// Answers to the short questionnaire filled in after reading feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireAnswer {
    /// Session the answers refer to
    pub session_id: Uuid,

    /// Owning student
    pub user_id: Uuid,

    /// First Likert answer, 1..=5
    pub q1: u8,

    /// Second Likert answer, 1..=5
    pub q2: u8,

    /// Free-text answer, at most 2000 characters
    pub open_answer: String,
}

impl QuestionnaireAnswer {
    /// Maximum length of the free-text answer, in characters.
    pub const OPEN_ANSWER_MAX_CHARS: usize = 2000;

    /// Checks Likert ranges and free-text length.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("q1", self.q1), ("q2", self.q2)] {
            if !SCORE_RANGE.contains(&value) {
                return Err(Error::validation_field(
                    field,
                    format!("expected 1 to 5, got {value}"),
                ));
            }
        }
        if self.open_answer.chars().count() > Self::OPEN_ANSWER_MAX_CHARS {
            return Err(Error::validation_field(
                "open_answer",
                "at most 2000 characters",
            ));
        }
        Ok(())
    }
}
