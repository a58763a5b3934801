// src/quiz/codec.rs

//! Answer/flag token grammar.
//!
//! An attempt stores two parallel comma-separated strings: the question order
//! (`"5,2,1"`) and the answer order (`"a,-,cf"`). Token *i* of the answer
//! order belongs to question *i* of the question order. A token is `-`
//! (unanswered) or a letter `a`-`e`, optionally suffixed with `f` (flagged).

use std::collections::{BTreeMap, BTreeSet};

use crate::{error::AppError, models::question::OptionLetter};

pub const UNANSWERED: &str = "-";
pub const FLAG_MARKER: char = 'f';

/// Decoded state of a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub answer: Option<OptionLetter>,
    pub flagged: bool,
}

impl Token {
    /// Decodes a raw token. Anything that is not a single letter `a`-`e` after
    /// removing flag markers is unanswered.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let flagged = raw.contains(FLAG_MARKER);
        let cleaned = strip_flags(raw);
        Token {
            answer: OptionLetter::parse(&cleaned),
            flagged,
        }
    }

    pub fn encode(&self) -> String {
        let mut out = match self.answer {
            Some(letter) => letter.as_char().to_string(),
            None => UNANSWERED.to_string(),
        };
        if self.flagged {
            out.push(FLAG_MARKER);
        }
        out
    }
}

/// Removes all flag markers from a raw token and trims it.
pub fn strip_flags(raw: &str) -> String {
    raw.replace(FLAG_MARKER, "").trim().to_string()
}

/// Whether a raw token follows the grammar: empty, `-`, or one letter, each
/// optionally carrying flag markers.
pub fn is_recognized(raw: &str) -> bool {
    let cleaned = strip_flags(raw);
    cleaned.is_empty() || cleaned == UNANSWERED || OptionLetter::parse(&cleaned).is_some()
}

/// Parses a question order string. Blank entries are dropped; any other
/// entry must be an integer.
pub fn parse_question_order(order: &str) -> Result<Vec<i64>, AppError> {
    order
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                AppError::Inconsistency(format!("question order entry '{}' is not an id", s))
            })
        })
        .collect()
}

/// Local view of an attempt: pure answers and the set of flagged questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    pub answers: BTreeMap<i64, OptionLetter>,
    pub flagged: BTreeSet<i64>,
}

impl LocalState {
    pub fn answer(&self, question_id: i64) -> Option<OptionLetter> {
        self.answers.get(&question_id).copied()
    }

    pub fn is_flagged(&self, question_id: i64) -> bool {
        self.flagged.contains(&question_id)
    }
}

/// Position-aligned tokens for one attempt.
///
/// Edits rewrite exactly one position and keep every other token verbatim,
/// so the wire string never loses data the client does not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    order: Vec<i64>,
    tokens: Vec<String>,
}

impl AnswerSheet {
    /// Builds a sheet from the two wire strings. A short answer order is
    /// right-padded with `-`; extra tokens past the question order are dropped.
    pub fn from_wire(question_order: &str, answer_order: &str) -> Result<Self, AppError> {
        let order = parse_question_order(question_order)?;

        let mut tokens: Vec<String> = answer_order
            .split(',')
            .map(|t| {
                let t = t.trim();
                if t.is_empty() { UNANSWERED.to_string() } else { t.to_string() }
            })
            .collect();

        if tokens.len() > order.len() {
            tracing::debug!(
                "answer order has {} tokens for {} questions, truncating",
                tokens.len(),
                order.len()
            );
            tokens.truncate(order.len());
        }
        tokens.resize(order.len(), UNANSWERED.to_string());

        Ok(Self { order, tokens })
    }

    /// Canonical sheet for a question order and a local state.
    pub fn from_state(order: &[i64], state: &LocalState) -> Self {
        let tokens = order
            .iter()
            .map(|id| {
                Token {
                    answer: state.answer(*id),
                    flagged: state.is_flagged(*id),
                }
                .encode()
            })
            .collect();
        Self {
            order: order.to_vec(),
            tokens,
        }
    }

    pub fn order(&self) -> &[i64] {
        &self.order
    }

    pub fn raw_tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self, question_id: i64) -> Option<usize> {
        self.order.iter().position(|id| *id == question_id)
    }

    pub fn token(&self, question_id: i64) -> Option<Token> {
        self.position(question_id).map(|i| Token::parse(&self.tokens[i]))
    }

    pub fn decode(&self) -> LocalState {
        let mut state = LocalState::default();
        for (id, raw) in self.order.iter().zip(&self.tokens) {
            let token = Token::parse(raw);
            if token.flagged {
                state.flagged.insert(*id);
            }
            if let Some(letter) = token.answer {
                state.answers.insert(*id, letter);
            }
        }
        state
    }

    /// Sets (or clears) the answer at a question's position, keeping its flag.
    pub fn set_answer(
        &mut self,
        question_id: i64,
        answer: Option<OptionLetter>,
    ) -> Result<(), AppError> {
        let idx = self.require_position(question_id)?;
        let flagged = self.tokens[idx].contains(FLAG_MARKER);
        self.tokens[idx] = Token { answer, flagged }.encode();
        Ok(())
    }

    /// Sets the flag at a question's position, keeping its answer.
    pub fn set_flag(&mut self, question_id: i64, flagged: bool) -> Result<(), AppError> {
        let idx = self.require_position(question_id)?;
        let answer = Token::parse(&self.tokens[idx]).answer;
        self.tokens[idx] = Token { answer, flagged }.encode();
        Ok(())
    }

    pub fn encode(&self) -> String {
        self.tokens.join(",")
    }

    fn require_position(&self, question_id: i64) -> Result<usize, AppError> {
        self.position(question_id).ok_or_else(|| {
            AppError::Inconsistency(format!(
                "question {} is not part of the attempt's question order",
                question_id
            ))
        })
    }
}
