// src/quiz/review.rs

use crate::{
    models::question::{OptionLetter, Question},
    quiz::{codec::LocalState, grading::normalize_key},
};

/// Outcome of one question in a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub ordinal: usize,
    pub question_id: i64,
    pub user_answer: Option<OptionLetter>,
    /// Normalized key; `None` when the key is missing or not a letter/numeral.
    pub correct_answer: Option<OptionLetter>,
    pub is_correct: bool,
    pub flagged: bool,
    pub explanation: Option<String>,
}

/// Builds one review item per ordered question.
pub fn build_review(questions: &[Question], state: &LocalState) -> Vec<ReviewItem> {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let user_answer = state.answer(q.id);
            let correct_answer = q.answer_key.as_deref().and_then(normalize_key);
            ReviewItem {
                ordinal: i + 1,
                question_id: q.id,
                user_answer,
                correct_answer,
                is_correct: user_answer.is_some() && user_answer == correct_answer,
                flagged: state.is_flagged(q.id),
                explanation: q.explanation.clone(),
            }
        })
        .collect()
}

/// `(correct, total)` over the review items.
pub fn tally(items: &[ReviewItem]) -> (usize, usize) {
    (items.iter().filter(|i| i.is_correct).count(), items.len())
}
