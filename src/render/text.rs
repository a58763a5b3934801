// src/render/text.rs

use std::sync::LazyLock;

use regex::Regex;

static MATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$(.*?)\$\$").expect("math pattern is valid"));

/// A piece of prompt text: plain prose or an inline math expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Math(String),
}

/// Splits text on `$$...$$` markers. Unterminated markers stay as plain text.
/// Empty text segments between adjacent expressions are omitted.
pub fn split_math(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MATH_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(text[last..whole.start()].to_string()));
        }
        segments.push(Segment::Math(caps[1].to_string()));
        last = whole.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }

    segments
}

/// Text with math markers removed, for plain-text outputs such as the terminal.
pub fn plain_text(text: &str) -> String {
    split_math(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(t) | Segment::Math(t) => t,
        })
        .collect()
}
