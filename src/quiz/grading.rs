// src/quiz/grading.rs

use std::collections::HashMap;

use crate::{
    models::question::OptionLetter,
    quiz::codec::{AnswerSheet, Token, is_recognized},
};

/// Result of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub correct: usize,
    pub total: usize,
    /// Percentage with two decimals, e.g. "83.33".
    pub grade: String,
    /// Question ids whose token did not follow the grammar (graded as incorrect).
    pub unrecognized: Vec<i64>,
    /// Question ids with no answer key available (graded as incorrect).
    pub missing_keys: Vec<i64>,
}

/// Normalizes an answer key: a letter `a`-`e` or a numeral `1`-`5`, case-insensitive.
pub fn normalize_key(key: &str) -> Option<OptionLetter> {
    OptionLetter::parse(key).or_else(|| OptionLetter::from_numeral(key))
}

/// Whether the user's letter matches the key.
pub fn is_correct(key: &str, answer: Option<OptionLetter>) -> bool {
    match (normalize_key(key), answer) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    }
}

/// `correct / max(total, 1) * 100` formatted to two decimals.
pub fn format_grade(correct: usize, total: usize) -> String {
    let percent = correct as f64 / total.max(1) as f64 * 100.0;
    format!("{:.2}", percent)
}

/// Grades every position of the sheet against the key lookup.
///
/// Used both when the user submits and when an attempt that expired on the
/// server is reconciled later, so both paths share one set of rules:
/// * Comparison is case-insensitive and accepts numeral keys.
/// * Unanswered or unrecognized tokens count as incorrect.
/// * The denominator is the attempt's question count (at least 1).
pub fn grade_sheet(sheet: &AnswerSheet, keys: &HashMap<i64, String>) -> GradeReport {
    let mut correct = 0;
    let mut unrecognized = Vec::new();
    let mut missing_keys = Vec::new();

    for (id, raw) in sheet.order().iter().zip(sheet.raw_tokens()) {
        if !is_recognized(raw) {
            tracing::warn!("Unrecognized answer token '{}' for question {}", raw, id);
            unrecognized.push(*id);
            continue;
        }

        let Some(key) = keys.get(id) else {
            tracing::warn!("Question id not found when grading: {}", id);
            missing_keys.push(*id);
            continue;
        };

        if is_correct(key, Token::parse(raw).answer) {
            correct += 1;
        }
    }

    let total = sheet.len();
    GradeReport {
        correct,
        total,
        grade: format_grade(correct, total),
        unrecognized,
        missing_keys,
    }
}
