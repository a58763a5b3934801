// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an attempt as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Ongoing,
    Finished,
    Submitted,
    Graded,
}

impl AttemptStatus {
    /// Whether the attempt is closed for edits (review only).
    pub fn is_closed(self) -> bool {
        !matches!(self, AttemptStatus::Ongoing)
    }
}

/// One timed sitting of a tryout by one user, as returned by `/quizattempt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub user_id: i64,

    pub tryout_id: String,

    pub attempt_number: i64,

    /// Two-decimal grade string such as "83.33", absent until graded.
    #[serde(default)]
    pub grade: Option<String>,

    pub status: AttemptStatus,

    /// Comma-separated question ids, e.g. "5,2,1,3".
    #[serde(default)]
    pub question_order: String,

    /// Comma-separated answer/flag tokens aligned with `question_order`, e.g. "-,a,-,bf".
    #[serde(default)]
    pub answer_order: String,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

/// DTO for `POST /quizattempt/start`.
#[derive(Debug, Serialize)]
pub struct StartAttemptRequest<'a> {
    pub tryout_id: &'a str,
}

/// DTO for `PATCH /quizattempt/{tryoutId}/{attemptNumber}`.
/// Only the fields that are set are sent.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct AttemptPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttemptStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl AttemptPatch {
    pub fn answer_order(order: String) -> Self {
        Self {
            answer_order: Some(order),
            ..Self::default()
        }
    }

    /// Marks the attempt finished now, with an optional grade.
    pub fn finish(submitted_at: DateTime<Utc>, grade: Option<String>) -> Self {
        Self {
            status: Some(AttemptStatus::Finished),
            submitted_at: Some(submitted_at),
            grade,
            ..Self::default()
        }
    }
}
