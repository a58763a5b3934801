// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::render::table::{Table, WireHeaders, WireRows, parse_table};

/// One of the five answer options a question may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 5] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
        OptionLetter::E,
    ];

    /// Parses a single letter `a`-`e`, case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(OptionLetter::A),
            'b' => Some(OptionLetter::B),
            'c' => Some(OptionLetter::C),
            'd' => Some(OptionLetter::D),
            'e' => Some(OptionLetter::E),
            _ => None,
        }
    }

    /// Parses a numeral key `1`-`5` (backends that store keys as digits).
    pub fn from_numeral(s: &str) -> Option<Self> {
        match s.trim() {
            "1" => Some(OptionLetter::A),
            "2" => Some(OptionLetter::B),
            "3" => Some(OptionLetter::C),
            "4" => Some(OptionLetter::D),
            "5" => Some(OptionLetter::E),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'a',
            OptionLetter::B => 'b',
            OptionLetter::C => 'c',
            OptionLetter::D => 'd',
            OptionLetter::E => 'e',
        }
    }

    pub fn numeral(self) -> char {
        match self {
            OptionLetter::A => '1',
            OptionLetter::B => '2',
            OptionLetter::C => '3',
            OptionLetter::D => '4',
            OptionLetter::E => '5',
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Question row as returned by `GET /questions?tryoutId=...`.
/// Answer key and explanation are only populated where the caller may see them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerQuestion {
    pub id: i64,

    #[serde(default)]
    pub question_text: String,

    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default)]
    pub option_e: Option<String>,

    /// Correct option, either a letter ("b") or a numeral ("2").
    #[serde(default)]
    pub answer_key: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub table_headers: Option<WireHeaders>,

    #[serde(default)]
    pub table_rows: Option<WireRows>,

    #[serde(default)]
    pub explanation_image_url: Option<String>,

    #[serde(default)]
    pub explanation_table_headers: Option<WireHeaders>,

    #[serde(default)]
    pub explanation_table_rows: Option<WireRows>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOption {
    pub letter: OptionLetter,
    pub text: String,
}

/// Local view model of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    /// Prompt text; inline math is delimited by `$$`.
    pub text: String,
    /// Non-empty options only, in letter order.
    pub options: Vec<QuestionOption>,
    pub answer_key: Option<String>,
    pub explanation: Option<String>,
    pub image: Option<String>,
    pub table: Option<Table>,
    pub explanation_image: Option<String>,
    pub explanation_table: Option<Table>,
}

impl Question {
    pub fn option(&self, letter: OptionLetter) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.letter == letter)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<ServerQuestion> for Question {
    fn from(q: ServerQuestion) -> Self {
        let options = [
            (OptionLetter::A, q.option_a),
            (OptionLetter::B, q.option_b),
            (OptionLetter::C, q.option_c),
            (OptionLetter::D, q.option_d),
            (OptionLetter::E, q.option_e),
        ]
        .into_iter()
        .filter_map(|(letter, text)| {
            text.filter(|t| !t.is_empty())
                .map(|text| QuestionOption { letter, text })
        })
        .collect();

        let table = parse_table(q.table_headers.as_ref(), q.table_rows.as_ref());
        let explanation_table = parse_table(
            q.explanation_table_headers.as_ref(),
            q.explanation_table_rows.as_ref(),
        );

        Question {
            id: q.id,
            text: q.question_text,
            options,
            answer_key: non_empty(q.answer_key),
            explanation: non_empty(q.explanation),
            image: non_empty(q.image_url),
            table,
            explanation_image: non_empty(q.explanation_image_url),
            explanation_table,
        }
    }
}
