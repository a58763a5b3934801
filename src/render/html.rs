// src/render/html.rs

use std::fmt::Write;

use crate::{
    models::question::{OptionLetter, Question},
    render::{
        table::Table,
        text::{Segment, split_math},
    },
    utils::html::{clean_html, escape_text},
};

/// Reader-selectable text size for the question area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSize {
    Small,
    #[default]
    Normal,
    Large,
}

impl FontSize {
    pub fn pixels(self) -> u32 {
        match self {
            FontSize::Small => 14,
            FontSize::Normal => 16,
            FontSize::Large => 18,
        }
    }
}

/// What to show alongside the question.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub font_size: FontSize,
    /// Option the user picked, highlighted when present.
    pub selected: Option<OptionLetter>,
    /// Marks the correct option (review mode).
    pub correct: Option<OptionLetter>,
    pub flagged: bool,
}

/// Renders prompt text, wrapping math segments in `<span class="math">`.
pub fn render_rich_text(text: &str) -> String {
    split_math(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(t) => clean_html(&t),
            Segment::Math(m) => format!("<span class=\"math\">{}</span>", escape_text(&m)),
        })
        .collect()
}

pub fn render_table(table: &Table) -> String {
    let mut out = String::from("<table><thead><tr>");
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", render_rich_text(header));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            if cell.colspan > 1 {
                let _ = write!(
                    out,
                    "<td colspan=\"{}\">{}</td>",
                    cell.colspan,
                    render_rich_text(&cell.value)
                );
            } else {
                let _ = write!(out, "<td>{}</td>", render_rich_text(&cell.value));
            }
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn render_image(url: &str) -> String {
    format!("<img src=\"{}\" alt=\"\">", escape_text(url))
}

/// Renders one question as an HTML fragment.
pub fn render_question(ordinal: usize, question: &Question, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let flagged = if opts.flagged { " flagged" } else { "" };

    let _ = write!(
        out,
        "<div class=\"question{}\" data-qid=\"{}\" style=\"font-size:{}px\">",
        flagged,
        question.id,
        opts.font_size.pixels()
    );
    let _ = write!(out, "<h3>Soal {}</h3>", ordinal);
    let _ = write!(out, "<p class=\"prompt\">{}</p>", render_rich_text(&question.text));

    if let Some(image) = &question.image {
        out.push_str(&render_image(image));
    }
    if let Some(table) = &question.table {
        out.push_str(&render_table(table));
    }

    out.push_str("<ol class=\"options\">");
    for option in &question.options {
        let mut classes = Vec::new();
        if opts.selected == Some(option.letter) {
            classes.push("selected");
        }
        if opts.correct == Some(option.letter) {
            classes.push("correct");
        } else if opts.correct.is_some() && opts.selected == Some(option.letter) {
            classes.push("wrong");
        }

        let _ = write!(
            out,
            "<li data-option=\"{}\" class=\"{}\"><span class=\"label\">{}.</span> {}</li>",
            option.letter,
            classes.join(" "),
            option.letter.as_char().to_ascii_uppercase(),
            render_rich_text(&option.text)
        );
    }
    out.push_str("</ol></div>");
    out
}

/// Renders the explanation block of a question (review mode).
pub fn render_explanation(question: &Question) -> String {
    let mut out = String::from("<div class=\"explanation\">");
    if let Some(explanation) = &question.explanation {
        let _ = write!(out, "<p>{}</p>", render_rich_text(explanation));
    }
    if let Some(image) = &question.explanation_image {
        out.push_str(&render_image(image));
    }
    if let Some(table) = &question.explanation_table {
        out.push_str(&render_table(table));
    }
    out.push_str("</div>");
    out
}
