//! Session and summary reports.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use alliance_core::types::SESSIONS_PER_PROGRAM;
use alliance_core::{Feedback, InternalScores, Level, Message, Session, SkillIndicators};

use crate::canvas::{Canvas, Font, PAGE_HEIGHT};
use crate::text::{truncate_chars, wrap};

const MARGIN_X: f32 = 40.0;
const INDENT_X: f32 = 60.0;
const ROW_DETAIL_X: f32 = 50.0;
const TOP_Y: f32 = PAGE_HEIGHT - 40.0;
const WRAP_COLUMNS: usize = 120;
const FEEDBACK_ITEM_CHARS: usize = 110;
const REFLECTIVE_QUESTION_CHARS: usize = 120;
const TRANSCRIPT_BREAK_Y: f32 = 60.0;
const SUMMARY_BREAK_Y: f32 = 70.0;

/// Tracks the baseline while writing top to bottom.
struct Layout {
    canvas: Canvas,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            canvas: Canvas::new(),
            y: TOP_Y,
        }
    }

    fn line(&mut self, x: f32, text: &str, advance: f32) {
        self.canvas.draw_string(x, self.y, text);
        self.y -= advance;
    }

    fn skip(&mut self, points: f32) {
        self.y -= points;
    }

    fn title(&mut self, title: &str) {
        self.canvas.set_font(Font::Bold, 14.0);
        self.line(MARGIN_X, title, 24.0);
    }

    fn heading(&mut self, heading: &str) {
        self.canvas.set_font(Font::Bold, 12.0);
        self.line(MARGIN_X, heading, 18.0);
    }

    fn meta(&mut self, entries: &[(&str, String)]) {
        self.canvas.set_font(Font::Regular, 10.0);
        for (key, value) in entries {
            self.line(MARGIN_X, &format!("{key}: {value}"), 14.0);
        }
    }

    /// Wrapped 9 pt body text, starting a new page below `break_below`.
    fn wrapped(&mut self, x: f32, text: &str, break_below: f32) {
        for chunk in wrap(text, WRAP_COLUMNS) {
            if self.y < break_below {
                self.canvas.show_page();
                self.y = TOP_Y;
                self.canvas.set_font(Font::Regular, 9.0);
            }
            self.line(x, &chunk, 12.0);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.canvas.finish()
    }
}

fn format_scores(scores: Option<&InternalScores>) -> String {
    match scores {
        Some(scores) => scores
            .pairs()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" "),
        None => "empathy=- structure=- alliance=-".to_string(),
    }
}

fn format_indicators(skills: &SkillIndicators) -> String {
    skills
        .pairs()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn level_label(level: Option<Level>) -> String {
    level.map(|l| l.to_string()).unwrap_or_default()
}

/// Feedback and transcript of one session, for administrators.
#[derive(Debug, Clone, Copy)]
pub struct SessionReport<'a> {
    /// The reported session
    pub session: &'a Session,
    /// Its feedback
    pub feedback: &'a Feedback,
    /// Its messages in turn order
    pub transcript: &'a [Message],
    /// Academic year of the student, when the profile exists
    pub academic_year: Option<Level>,
}

impl SessionReport<'_> {
    /// Report title.
    pub fn title(&self) -> String {
        format!("ALLIANCE OSTEO 2026 — Session {}", self.session.session_number)
    }

    /// Renders the report as PDF bytes.
    pub fn render(&self) -> Vec<u8> {
        let mut layout = Layout::new();
        layout.title(&self.title());
        layout.meta(&[
            ("Student (user_id)", self.session.user_id.to_string()),
            ("Session", self.session.session_number.to_string()),
            ("Date", format_date(self.session.ended_at)),
            ("Level(hidden)", self.session.difficulty.to_string()),
            ("Academic year", level_label(self.academic_year)),
            ("Scores", format_scores(Some(&self.feedback.internal_scores))),
            ("Indicators", format_indicators(&self.feedback.skill_indicators)),
        ]);

        layout.skip(10.0);
        layout.heading("Feedback (student-facing)");
        layout.canvas.set_font(Font::Regular, 10.0);

        let facing = &self.feedback.student_facing;
        for (label, items) in [
            ("Strengths", &facing.strengths),
            ("Areas to improve", &facing.areas_to_improve),
        ] {
            layout.line(MARGIN_X, &format!("{label}:"), 14.0);
            for item in items {
                let item = truncate_chars(item, FEEDBACK_ITEM_CHARS);
                layout.line(INDENT_X, &format!("- {item}"), 14.0);
            }
        }

        if !facing.reflective_question.is_empty() {
            layout.skip(6.0);
            layout.line(MARGIN_X, "Reflective question:", 14.0);
            let question = truncate_chars(&facing.reflective_question, REFLECTIVE_QUESTION_CHARS);
            layout.line(INDENT_X, question, 18.0);
        }

        layout.skip(6.0);
        layout.heading("Transcript");
        layout.canvas.set_font(Font::Regular, 9.0);
        for message in self.transcript {
            let line = format!("[{}] {}", message.role, message.content);
            layout.wrapped(MARGIN_X, &line, TRANSCRIPT_BREAK_Y);
        }

        layout.finish()
    }
}

/// One student's results across the whole program, for administrators.
#[derive(Debug, Clone, Copy)]
pub struct SummaryReport<'a> {
    /// The student
    pub user_id: Uuid,
    /// Their email, when known
    pub email: Option<&'a str>,
    /// Their academic year, when known
    pub academic_year: Option<Level>,
    /// Their sessions in session-number order
    pub sessions: &'a [Session],
    /// Every feedback row of those sessions
    pub feedback: &'a [Feedback],
}

impl SummaryReport<'_> {
    /// Report title.
    pub fn title(&self) -> String {
        format!("ALLIANCE OSTEO 2026 — Summary Report ({SESSIONS_PER_PROGRAM} sessions)")
    }

    /// Sessions the student has ended.
    pub fn completed_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.ended_at.is_some()).count()
    }

    /// Renders the report as PDF bytes.
    pub fn render(&self) -> Vec<u8> {
        let by_session: HashMap<Uuid, &Feedback> =
            self.feedback.iter().map(|f| (f.session_id, f)).collect();

        let mut layout = Layout::new();
        layout.title(&self.title());
        layout.meta(&[
            ("Student (user_id)", self.user_id.to_string()),
            ("Email", self.email.unwrap_or_default().to_string()),
            ("Academic year", level_label(self.academic_year)),
            (
                "Completed sessions",
                format!("{}/{SESSIONS_PER_PROGRAM}", self.completed_sessions()),
            ),
        ]);

        layout.skip(10.0);
        layout.heading(&format!("Résumé des {SESSIONS_PER_PROGRAM} sessions"));
        layout.canvas.set_font(Font::Regular, 9.0);

        for session in self.sessions {
            let feedback = by_session.get(&session.id);
            let header = format!(
                "Session {} | Date: {} | Level: {}",
                session.session_number,
                format_date(session.ended_at),
                session.difficulty
            );
            let scores = format!(
                "Scores: {}",
                format_scores(feedback.map(|f| &f.internal_scores))
            );
            let skills = feedback.map(|f| f.skill_indicators).unwrap_or_default();
            let skills = format!(
                "Skills: AL={} REF={} EV={} OQ={} SC={}",
                skills.active_listening,
                skills.reformulation,
                skills.emotional_validation,
                skills.open_questions,
                skills.structure_clarity
            );

            layout.wrapped(MARGIN_X, &header, SUMMARY_BREAK_Y);
            layout.wrapped(ROW_DETAIL_X, &scores, SUMMARY_BREAK_Y);
            layout.wrapped(ROW_DETAIL_X, &skills, SUMMARY_BREAK_Y);
            layout.skip(6.0);
        }

        layout.finish()
    }
}
