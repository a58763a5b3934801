// src/quiz/navigation.rs

use std::collections::HashMap;

use crate::{models::question::Question, quiz::codec::LocalState};

/// Orders questions by the attempt's question order.
///
/// Ids missing from `questions` are skipped. With an empty order the
/// questions are sorted by id.
pub fn order_questions(questions: Vec<Question>, order: &[i64]) -> Vec<Question> {
    if order.is_empty() {
        let mut sorted = questions;
        sorted.sort_by_key(|q| q.id);
        return sorted;
    }

    let mut by_id: HashMap<i64, Question> = questions.into_iter().map(|q| (q.id, q)).collect();
    order
        .iter()
        .filter_map(|id| {
            let question = by_id.remove(id);
            if question.is_none() {
                tracing::warn!("Question {} from the attempt order was not returned", id);
            }
            question
        })
        .collect()
}

/// 1-based position of a question.
pub fn ordinal_of(questions: &[Question], question_id: i64) -> Option<usize> {
    questions
        .iter()
        .position(|q| q.id == question_id)
        .map(|i| i + 1)
}

pub fn question_at(questions: &[Question], ordinal: usize) -> Option<&Question> {
    ordinal.checked_sub(1).and_then(|i| questions.get(i))
}

/// Ordinals (1-based) of answered questions.
pub fn answered_ordinals(questions: &[Question], state: &LocalState) -> Vec<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| state.answer(q.id).is_some())
        .map(|(i, _)| i + 1)
        .collect()
}

/// Ordinals (1-based) of flagged questions.
pub fn flagged_ordinals(questions: &[Question], state: &LocalState) -> Vec<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| state.is_flagged(q.id))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Submission is only offered once every question carries a letter.
pub fn all_answered(questions: &[Question], state: &LocalState) -> bool {
    !questions.is_empty() && questions.iter().all(|q| state.answer(q.id).is_some())
}

/// Cursor over the ordered questions for one-at-a-time mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    ordinal: usize,
    total: usize,
}

impl Cursor {
    /// Starts at the first question; `None` when there are no questions.
    pub fn new(total: usize) -> Option<Self> {
        (total > 0).then_some(Self { ordinal: 1, total })
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn has_previous(&self) -> bool {
        self.ordinal > 1
    }

    pub fn has_next(&self) -> bool {
        self.ordinal < self.total
    }

    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.ordinal -= 1;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.ordinal += 1;
            true
        } else {
            false
        }
    }

    /// Jumps to an ordinal; out-of-range ordinals are ignored.
    pub fn select(&mut self, ordinal: usize) -> bool {
        if (1..=self.total).contains(&ordinal) {
            self.ordinal = ordinal;
            true
        } else {
            false
        }
    }
}
