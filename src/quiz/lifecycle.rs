// src/quiz/lifecycle.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    api::{AttemptStore, require_tryout_id},
    config::{HIGH_GRADE_THRESHOLD, MEDIUM_GRADE_THRESHOLD},
    error::AppError,
    models::{
        attempt::{Attempt, AttemptPatch, AttemptStatus},
        question::Question,
    },
    quiz::{
        codec::AnswerSheet,
        countdown,
        grading::{GradeReport, grade_sheet},
    },
};

/// Where an attempt stands right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Ongoing with time left.
    Active { remaining_seconds: i64 },
    /// Ongoing on the server but out of time; needs grading.
    Expired,
    /// Finished, submitted or graded.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    High,
    Medium,
    Low,
}

/// Seconds left for an attempt.
///
/// * Uses the attempt's own duration, else `fallback_duration` (the tryout's).
/// * Zero when the start time or both durations are missing.
/// * Otherwise the same count the ticker shows.
pub fn remaining_seconds(
    attempt: &Attempt,
    fallback_duration: Option<i64>,
    now: DateTime<Utc>,
) -> i64 {
    let (Some(start), Some(duration)) = (
        attempt.start_time,
        attempt.duration_minutes.or(fallback_duration),
    ) else {
        return 0;
    };

    countdown::remaining_seconds(start, duration, now)
}

pub fn classify(attempt: &Attempt, fallback_duration: Option<i64>, now: DateTime<Utc>) -> AttemptPhase {
    if attempt.status != AttemptStatus::Ongoing {
        return AttemptPhase::Finished;
    }
    match remaining_seconds(attempt, fallback_duration, now) {
        0 => AttemptPhase::Expired,
        remaining_seconds => AttemptPhase::Active { remaining_seconds },
    }
}

/// A new attempt may start only while no attempt is still running.
pub fn can_start(attempts: &[Attempt], fallback_duration: Option<i64>, now: DateTime<Utc>) -> bool {
    !attempts
        .iter()
        .any(|a| matches!(classify(a, fallback_duration, now), AttemptPhase::Active { .. }))
}

/// Starts a new attempt for a tryout.
///
/// * Refused with `Validation` while another attempt is active.
/// * Ongoing attempts that ran out of time are closed first. Failures there
///   are logged and ignored.
pub async fn start_new_attempt<S>(
    store: &S,
    tryout_id: &str,
    fallback_duration: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Attempt, AppError>
where
    S: AttemptStore + ?Sized,
{
    let tryout_id = require_tryout_id(tryout_id)?;
    let attempts = store.list_attempts(tryout_id).await?;

    if !can_start(&attempts, fallback_duration, now) {
        return Err(AppError::Validation(
            "another attempt of this tryout is still running".to_string(),
        ));
    }

    for expired in attempts
        .iter()
        .filter(|a| classify(a, fallback_duration, now) == AttemptPhase::Expired)
    {
        let patch = AttemptPatch::finish(now, None);
        if let Err(e) = store
            .update_attempt(tryout_id, expired.attempt_number, &patch)
            .await
        {
            tracing::warn!(
                "Failed to close expired attempt #{}: {}",
                expired.attempt_number,
                e
            );
        }
    }

    store.start_attempt(tryout_id).await
}

/// Grades an attempt that ran out of time on the server and closes it.
///
/// The grade is computed with the same rules as a normal submission.
pub async fn grade_expired_attempt<S>(
    store: &S,
    attempt: &Attempt,
    now: DateTime<Utc>,
) -> Result<(Attempt, GradeReport), AppError>
where
    S: AttemptStore + ?Sized,
{
    if attempt.status.is_closed() {
        return Err(AppError::Validation(format!(
            "attempt #{} is already finished",
            attempt.attempt_number
        )));
    }

    let questions: Vec<Question> = store
        .list_questions(&attempt.tryout_id)
        .await?
        .into_iter()
        .map(Question::from)
        .collect();
    let keys: HashMap<i64, String> = questions
        .into_iter()
        .filter_map(|q| q.answer_key.map(|k| (q.id, k)))
        .collect();

    let sheet = AnswerSheet::from_wire(&attempt.question_order, &attempt.answer_order)?;
    let report = grade_sheet(&sheet, &keys);

    let patch = AttemptPatch::finish(now, Some(report.grade.clone()));
    let updated = store
        .update_attempt(&attempt.tryout_id, attempt.attempt_number, &patch)
        .await
        .map_err(|e| {
            tracing::error!("Failed to grade expired attempt: {}", e);
            e
        })?;

    tracing::info!(
        "Graded expired attempt #{} with {}",
        attempt.attempt_number,
        report.grade
    );
    Ok((updated, report))
}

/// Highest grade among the attempts; unparseable grades count as 0.
pub fn best_grade(attempts: &[Attempt]) -> Option<f64> {
    attempts
        .iter()
        .map(|a| {
            a.grade
                .as_deref()
                .and_then(|g| g.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        })
        .reduce(f64::max)
}

pub fn grade_band(grade: f64) -> GradeBand {
    if grade >= HIGH_GRADE_THRESHOLD {
        GradeBand::High
    } else if grade >= MEDIUM_GRADE_THRESHOLD {
        GradeBand::Medium
    } else {
        GradeBand::Low
    }
}

/// `HH:MM:SS`; zero or negative gives `00:00:00`.
pub fn format_hms(seconds: i64) -> String {
    if seconds <= 0 {
        return "00:00:00".to_string();
    }
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Human readable duration, e.g. `1h 30m (90 minutes)`.
pub fn format_minutes_readable(minutes: Option<i64>) -> String {
    let Some(minutes) = minutes.filter(|m| *m > 0) else {
        return "N/A".to_string();
    };
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, _) => format!("{} minutes", minutes),
        (h, 0) => format!("{}h ({} minutes)", h, minutes),
        (h, m) => format!("{}h {}m ({} minutes)", h, m, minutes),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::question::ServerQuestion;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn attempt(number: i64, status: AttemptStatus, start: Option<&str>) -> Attempt {
        Attempt {
            id: number,
            user_id: 1,
            tryout_id: "TO1".to_string(),
            attempt_number: number,
            grade: None,
            status,
            question_order: "1,2".to_string(),
            answer_order: "a,c".to_string(),
            start_time: start.map(at),
            submitted_at: None,
            duration_minutes: Some(30),
        }
    }

    struct ListStore {
        attempts: Vec<Attempt>,
        patched: Mutex<Vec<(i64, AttemptPatch)>>,
    }

    #[async_trait]
    impl AttemptStore for ListStore {
        async fn start_attempt(&self, tryout_id: &str) -> Result<Attempt, AppError> {
            let mut next = attempt(self.attempts.len() as i64 + 1, AttemptStatus::Ongoing, None);
            next.tryout_id = tryout_id.to_string();
            Ok(next)
        }

        async fn get_attempt(&self, _tryout_id: &str, n: i64) -> Result<Attempt, AppError> {
            self.attempts
                .iter()
                .find(|a| a.attempt_number == n)
                .cloned()
                .ok_or(AppError::Remote {
                    status: 404,
                    message: "not found".to_string(),
                })
        }

        async fn list_attempts(&self, _tryout_id: &str) -> Result<Vec<Attempt>, AppError> {
            Ok(self.attempts.clone())
        }

        async fn update_attempt(
            &self,
            _tryout_id: &str,
            n: i64,
            patch: &AttemptPatch,
        ) -> Result<Attempt, AppError> {
            self.patched.lock().unwrap().push((n, patch.clone()));
            let mut updated = self.get_attempt("", n).await?;
            if let Some(status) = patch.status {
                updated.status = status;
            }
            updated.grade = patch.grade.clone();
            Ok(updated)
        }

        async fn list_questions(&self, _tryout_id: &str) -> Result<Vec<ServerQuestion>, AppError> {
            Ok(vec![
                ServerQuestion {
                    id: 1,
                    answer_key: Some("1".to_string()),
                    ..ServerQuestion::default()
                },
                ServerQuestion {
                    id: 2,
                    answer_key: Some("b".to_string()),
                    ..ServerQuestion::default()
                },
            ])
        }
    }

    #[test]
    fn test_remaining_rounds_up_and_falls_back() {
        let now = at("2025-03-01T08:29:59.200Z");
        let a = attempt(1, AttemptStatus::Ongoing, Some("2025-03-01T08:00:00Z"));
        assert_eq!(remaining_seconds(&a, None, now), 1);

        let mut no_duration = a.clone();
        no_duration.duration_minutes = None;
        assert_eq!(remaining_seconds(&no_duration, None, now), 0);
        assert_eq!(remaining_seconds(&no_duration, Some(60), now), 1801);

        let no_start = attempt(1, AttemptStatus::Ongoing, None);
        assert_eq!(remaining_seconds(&no_start, Some(60), now), 0);
    }

    #[test]
    fn test_huge_duration_never_panics() {
        let now = at("2025-03-01T08:10:00Z");
        let mut a = attempt(1, AttemptStatus::Ongoing, Some("2025-03-01T08:00:00Z"));

        a.duration_minutes = Some(i64::MAX / 60);
        assert!(matches!(classify(&a, None, now), AttemptPhase::Active { .. }));

        a.duration_minutes = Some(10_000_000_000_000);
        assert!(remaining_seconds(&a, None, now) > 0);
        assert!(!can_start(&[a.clone()], None, now));

        a.duration_minutes = None;
        assert!(remaining_seconds(&a, Some(i64::MAX), now) > 0);
    }

    #[test]
    fn test_matches_ticker_count() {
        let start = at("2025-03-01T08:00:00Z");
        let a = attempt(1, AttemptStatus::Ongoing, Some("2025-03-01T08:00:00Z"));
        for now in [
            "2025-03-01T07:55:00Z",
            "2025-03-01T08:00:00Z",
            "2025-03-01T08:12:34.567Z",
            "2025-03-01T08:29:59.999Z",
            "2025-03-01T08:45:00Z",
        ] {
            let now = at(now);
            assert_eq!(
                remaining_seconds(&a, None, now),
                countdown::remaining_seconds(start, 30, now)
            );
        }
    }

    #[test]
    fn test_classify_phases() {
        let start = "2025-03-01T08:00:00Z";
        let ongoing = attempt(1, AttemptStatus::Ongoing, Some(start));
        let graded = attempt(2, AttemptStatus::Graded, Some(start));

        assert_eq!(
            classify(&ongoing, None, at("2025-03-01T08:29:00Z")),
            AttemptPhase::Active { remaining_seconds: 60 }
        );
        assert_eq!(classify(&ongoing, None, at("2025-03-01T08:30:00Z")), AttemptPhase::Expired);
        assert_eq!(classify(&graded, None, at("2025-03-01T08:10:00Z")), AttemptPhase::Finished);
    }

    #[tokio::test]
    async fn test_start_refused_while_active() {
        let store = ListStore {
            attempts: vec![attempt(1, AttemptStatus::Ongoing, Some("2025-03-01T08:00:00Z"))],
            patched: Mutex::new(Vec::new()),
        };

        let result = start_new_attempt(&store, "TO1", None, at("2025-03-01T08:10:00Z")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.patched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_closes_expired_attempts_first() {
        let store = ListStore {
            attempts: vec![
                attempt(1, AttemptStatus::Finished, Some("2025-03-01T06:00:00Z")),
                attempt(2, AttemptStatus::Ongoing, Some("2025-03-01T07:00:00Z")),
            ],
            patched: Mutex::new(Vec::new()),
        };

        let started = start_new_attempt(&store, "TO1", None, at("2025-03-01T08:10:00Z"))
            .await
            .unwrap();

        assert_eq!(started.attempt_number, 3);
        let patched = store.patched.lock().unwrap();
        assert_eq!(patched.len(), 1);
        assert_eq!(patched[0].0, 2);
        assert_eq!(patched[0].1.status, Some(AttemptStatus::Finished));
    }

    #[tokio::test]
    async fn test_grade_expired_uses_shared_rules() {
        let expired = attempt(1, AttemptStatus::Ongoing, Some("2025-03-01T07:00:00Z"));
        let store = ListStore {
            attempts: vec![expired.clone()],
            patched: Mutex::new(Vec::new()),
        };

        let (updated, report) = grade_expired_attempt(&store, &expired, at("2025-03-01T09:00:00Z"))
            .await
            .unwrap();

        // Key "1" matches "a"; "c" does not match "b".
        assert_eq!(report.grade, "50.00");
        assert_eq!(updated.grade.as_deref(), Some("50.00"));
        assert_eq!(updated.status, AttemptStatus::Finished);
    }

    #[test]
    fn test_best_grade_and_band() {
        let mut a = attempt(1, AttemptStatus::Graded, None);
        let mut b = attempt(2, AttemptStatus::Graded, None);
        let mut c = attempt(3, AttemptStatus::Graded, None);
        a.grade = Some("66.67".to_string());
        b.grade = Some("oops".to_string());
        c.grade = Some("83.33".to_string());

        assert_eq!(best_grade(&[a.clone(), b.clone(), c]), Some(83.33));
        assert_eq!(best_grade(&[b]), Some(0.0));
        assert_eq!(best_grade(&[]), None);

        assert_eq!(grade_band(80.0), GradeBand::High);
        assert_eq!(grade_band(41.0), GradeBand::Medium);
        assert_eq!(grade_band(40.99), GradeBand::Low);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(-5), "00:00:00");

        assert_eq!(format_minutes_readable(Some(90)), "1h 30m (90 minutes)");
        assert_eq!(format_minutes_readable(Some(120)), "2h (120 minutes)");
        assert_eq!(format_minutes_readable(Some(45)), "45 minutes");
        assert_eq!(format_minutes_readable(None), "N/A");
    }
}
