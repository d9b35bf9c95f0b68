//! The 16-session program: planning, seeding, progression and pacing.
//!
//! Every student follows the same shape of program. Session 1 is always an
//! easy (`L1`) patient; later difficulties never repeat back to back. Four
//! sessions among 2..=16 hide a patient that must be referred elsewhere,
//! two immediately and two after the interview.

mod proptests;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::store::Store;
use crate::types::{
    Difficulty, Gender, Language, Session, SessionStatus, StudentProgram, SESSIONS_PER_PROGRAM,
};

/// Ages a simulated patient can have.
pub const PATIENT_AGES: [u8; 9] = [12, 15, 18, 24, 32, 41, 52, 67, 74];

/// Number of new sessions a student may complete per ISO week.
pub const WEEKLY_SESSION_LIMIT: usize = 2;

/// Patients younger than this are labelled as children.
const ADULT_AGE: u8 = 17;

// ============================================================================
// Planning
// ============================================================================

/// Draws the referral plan of a student.
///
/// Sessions 2..=16 are shuffled; the first two (sorted) need immediate
/// referral, the next two (sorted) delayed referral.
pub fn plan_program<R: Rng + ?Sized>(user_id: Uuid, rng: &mut R) -> StudentProgram {
    let mut numbers: Vec<u8> = (2..=SESSIONS_PER_PROGRAM).collect();
    numbers.shuffle(rng);

    let mut immediate = numbers[..2].to_vec();
    let mut delayed = numbers[2..4].to_vec();
    immediate.sort_unstable();
    delayed.sort_unstable();

    StudentProgram {
        user_id,
        reorientation_immediate_sessions: immediate,
        reorientation_delayed_sessions: delayed,
    }
}

/// Draws one difficulty per session, indexed by `session_number - 1`.
pub fn plan_difficulties<R: Rng + ?Sized>(rng: &mut R) -> Vec<Difficulty> {
    let mut difficulties = Vec::with_capacity(usize::from(SESSIONS_PER_PROGRAM));
    let mut previous = Difficulty::L1;
    difficulties.push(previous);

    for _ in 2..=SESSIONS_PER_PROGRAM {
        let choices: Vec<Difficulty> = Difficulty::ALL
            .iter()
            .copied()
            .filter(|d| *d != previous)
            .collect();
        previous = choices[rng.random_range(0..choices.len())];
        difficulties.push(previous);
    }
    difficulties
}

/// Builds the sessions missing from a student's program.
///
/// `existing` lists the session numbers already stored; they are skipped.
pub fn plan_sessions<R: Rng + ?Sized>(
    user_id: Uuid,
    program: &StudentProgram,
    existing: &[u8],
    rng: &mut R,
) -> Vec<Session> {
    let difficulties = plan_difficulties(rng);

    (1..=SESSIONS_PER_PROGRAM)
        .zip(difficulties)
        .filter(|(number, _)| !existing.contains(number))
        .map(|(number, difficulty)| Session {
            id: Uuid::new_v4(),
            user_id,
            session_number: number,
            status: if number == 1 {
                SessionStatus::Available
            } else {
                SessionStatus::Locked
            },
            difficulty,
            reorientation: program.reorientation_for(number),
            patient_age: PATIENT_AGES[rng.random_range(0..PATIENT_AGES.len())],
            patient_gender: if rng.random_bool(0.5) {
                Gender::Female
            } else {
                Gender::Male
            },
            patient_opening_starts: rng.random_bool(0.5),
            started_at: None,
            ended_at: None,
        })
        .collect()
}

// ============================================================================
// Seeding
// ============================================================================

/// Makes sure a student has a referral plan and all 16 sessions.
///
/// Safe to call on every request: nothing is written once the program is
/// complete. Returns the student's sessions ordered by number.
pub async fn ensure_sessions_seeded(store: &dyn Store, user_id: Uuid) -> Result<Vec<Session>> {
    let program = match store.program(user_id).await? {
        Some(program) => program,
        None => {
            let program = plan_program(user_id, &mut rand::rng());
            store.insert_program(&program).await?;
            info!(%user_id, "Created student program");
            // Re-read so a concurrent insert wins consistently.
            store.program(user_id).await?.unwrap_or(program)
        }
    };

    let sessions = store.sessions_for_user(user_id).await?;
    if sessions.len() >= usize::from(SESSIONS_PER_PROGRAM) {
        return Ok(sessions);
    }

    let existing: Vec<u8> = sessions.iter().map(|s| s.session_number).collect();
    let missing = plan_sessions(user_id, &program, &existing, &mut rand::rng());
    debug!(%user_id, count = missing.len(), "Seeding sessions");
    store.insert_sessions(&missing).await?;

    store.sessions_for_user(user_id).await
}

// ============================================================================
// Progression
// ============================================================================

/// The session the student should work on: the lowest-numbered one that is
/// in progress or available.
pub fn current_session(sessions: &[Session]) -> Option<&Session> {
    sessions
        .iter()
        .filter(|s| s.status.is_open())
        .min_by_key(|s| s.session_number)
}

/// Number shown on the dashboard as the next session.
///
/// Falls back to 16 once every session is completed, and to 1 otherwise.
pub fn available_session_number(sessions: &[Session]) -> u8 {
    if let Some(session) = current_session(sessions) {
        return session.session_number;
    }
    let completed = sessions.iter().filter(|s| s.is_completed()).count();
    if completed >= usize::from(SESSIONS_PER_PROGRAM) {
        SESSIONS_PER_PROGRAM
    } else {
        1
    }
}

/// Makes the session after `session_number` available if it is locked.
///
/// Returns `true` when a session was unlocked.
pub async fn unlock_next(store: &dyn Store, user_id: Uuid, session_number: u8) -> Result<bool> {
    if session_number >= SESSIONS_PER_PROGRAM {
        return Ok(false);
    }
    let unlocked = store.unlock_session(user_id, session_number + 1).await?;
    if unlocked {
        debug!(%user_id, session_number = session_number + 1, "Unlocked session");
    }
    Ok(unlocked)
}

// ============================================================================
// Pacing
// ============================================================================

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days = i64::from(now.weekday().num_days_from_monday());
    (now.date_naive() - Duration::days(days))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Sessions completed during the week containing `now`.
pub fn completed_this_week(sessions: &[Session], now: DateTime<Utc>) -> usize {
    let start = week_start(now);
    let end = start + Duration::days(7);
    sessions
        .iter()
        .filter(|s| s.is_completed())
        .filter(|s| s.ended_at.is_some_and(|t| t >= start && t < end))
        .count()
}

// ============================================================================
// Presentation helpers
// ============================================================================

/// Localized label for the simulated patient, e.g. `Femme` or `Boy`.
pub fn gender_label(age: u8, gender: Gender, language: Language) -> &'static str {
    let child = age < ADULT_AGE;
    match (language, gender, child) {
        (Language::En, Gender::Female, true) => "Girl",
        (Language::En, Gender::Male, true) => "Boy",
        (Language::En, Gender::Female, false) => "Woman",
        (Language::En, Gender::Male, false) => "Man",
        (Language::Fr, Gender::Female, true) => "Fille",
        (Language::Fr, Gender::Male, true) => "Garçon",
        (Language::Fr, Gender::Female, false) => "Femme",
        (Language::Fr, Gender::Male, false) => "Homme",
    }
}

/// Turn index following `last`, starting at 1.
pub fn next_turn_index(last: Option<u32>) -> u32 {
    last.map_or(1, |turn| turn + 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn completed_at(user_id: Uuid, number: u8, ended_at: DateTime<Utc>) -> Session {
        let program = plan_program(user_id, &mut StdRng::seed_from_u64(1));
        let mut session = plan_sessions(user_id, &program, &[], &mut StdRng::seed_from_u64(1))
            .into_iter()
            .nth(usize::from(number - 1))
            .unwrap();
        session.status = SessionStatus::Completed;
        session.ended_at = Some(ended_at);
        session
    }

    #[test]
    fn test_plan_sessions_first_available_rest_locked() {
        let mut rng = StdRng::seed_from_u64(7);
        let user = Uuid::new_v4();
        let program = plan_program(user, &mut rng);
        let sessions = plan_sessions(user, &program, &[], &mut rng);

        assert_eq!(sessions.len(), 16);
        assert_eq!(sessions[0].status, SessionStatus::Available);
        assert_eq!(sessions[0].difficulty, Difficulty::L1);
        assert!(sessions[1..].iter().all(|s| s.status == SessionStatus::Locked));
    }

    #[test]
    fn test_plan_sessions_skips_existing() {
        let mut rng = StdRng::seed_from_u64(3);
        let user = Uuid::new_v4();
        let program = plan_program(user, &mut rng);
        let sessions = plan_sessions(user, &program, &[1, 2, 16], &mut rng);

        let numbers: Vec<u8> = sessions.iter().map(|s| s.session_number).collect();
        assert_eq!(numbers, (3..=15).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn test_ensure_sessions_seeded_is_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let first = ensure_sessions_seeded(&store, user).await.unwrap();
        let second = ensure_sessions_seeded(&store, user).await.unwrap();

        assert_eq!(first.len(), 16);
        assert_eq!(first, second);
        let program = store.program(user).await.unwrap().unwrap();
        for session in &first {
            assert_eq!(
                session.reorientation,
                program.reorientation_for(session.session_number)
            );
        }
    }

    #[tokio::test]
    async fn test_unlock_next() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        ensure_sessions_seeded(&store, user).await.unwrap();

        assert!(unlock_next(&store, user, 1).await.unwrap());
        assert!(!unlock_next(&store, user, 1).await.unwrap());
        assert!(!unlock_next(&store, user, 16).await.unwrap());

        let sessions = store.sessions_for_user(user).await.unwrap();
        assert_eq!(sessions[1].status, SessionStatus::Available);
        assert_eq!(sessions[2].status, SessionStatus::Locked);
    }

    #[test]
    fn test_current_session_prefers_lowest_open() {
        let mut rng = StdRng::seed_from_u64(11);
        let user = Uuid::new_v4();
        let program = plan_program(user, &mut rng);
        let mut sessions = plan_sessions(user, &program, &[], &mut rng);
        sessions[0].status = SessionStatus::Completed;
        sessions[1].status = SessionStatus::InProgress;
        sessions[2].status = SessionStatus::Available;

        assert_eq!(current_session(&sessions).unwrap().session_number, 2);
        assert_eq!(available_session_number(&sessions), 2);
    }

    #[test]
    fn test_available_session_number_fallbacks() {
        let mut rng = StdRng::seed_from_u64(5);
        let user = Uuid::new_v4();
        let program = plan_program(user, &mut rng);
        let mut sessions = plan_sessions(user, &program, &[], &mut rng);
        for s in &mut sessions {
            s.status = SessionStatus::Completed;
        }
        assert_eq!(available_session_number(&sessions), 16);

        sessions[4].status = SessionStatus::Locked;
        assert_eq!(available_session_number(&sessions), 1);
        assert_eq!(available_session_number(&[]), 1);
    }

    #[test]
    fn test_week_start_is_monday_midnight() {
        // Thursday 2026-01-08 15:42 UTC
        let now = Utc.with_ymd_and_hms(2026, 1, 8, 15, 42, 7).unwrap();
        assert_eq!(
            week_start(now),
            Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()
        );

        let monday = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_completed_this_week_window() {
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 1, 8, 12, 0, 0).unwrap();
        let sessions = vec![
            completed_at(user, 1, Utc.with_ymd_and_hms(2026, 1, 4, 23, 59, 59).unwrap()),
            completed_at(user, 2, Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()),
            completed_at(user, 3, Utc.with_ymd_and_hms(2026, 1, 11, 23, 59, 0).unwrap()),
            completed_at(user, 4, Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap()),
        ];
        assert_eq!(completed_this_week(&sessions, now), 2);
    }

    #[test]
    fn test_gender_label() {
        assert_eq!(gender_label(12, Gender::Female, Language::En), "Girl");
        assert_eq!(gender_label(16, Gender::Male, Language::En), "Boy");
        assert_eq!(gender_label(17, Gender::Male, Language::En), "Man");
        assert_eq!(gender_label(74, Gender::Female, Language::En), "Woman");
        assert_eq!(gender_label(15, Gender::Female, Language::Fr), "Fille");
        assert_eq!(gender_label(15, Gender::Male, Language::Fr), "Garçon");
        assert_eq!(gender_label(41, Gender::Female, Language::Fr), "Femme");
        assert_eq!(gender_label(18, Gender::Male, Language::Fr), "Homme");
    }

    #[test]
    fn test_next_turn_index() {
        assert_eq!(next_turn_index(None), 1);
        assert_eq!(next_turn_index(Some(7)), 8);
    }
}
