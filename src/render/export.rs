// src/render/export.rs

use std::{fs::File, path::Path};

use docx_rs::{
    Docx, Paragraph, Run, Table as DocxTable, TableCell as DocxCell, TableRow,
};

use crate::{
    error::AppError,
    models::question::Question,
    quiz::{grading::normalize_key, lifecycle::format_minutes_readable},
    render::{table::Table, text::plain_text},
};

/// Default file name of the exported review.
pub const DEFAULT_EXPORT_FILE: &str = "Soal_Tryout.docx";

const TITLE_SIZE: usize = 32;

/// Header block of the exported document.
#[derive(Debug, Clone, Default)]
pub struct ExportMeta {
    pub tryout_name: String,
    pub duration_minutes: Option<i64>,
    pub grade: Option<String>,
}

/// Builds the question/explanation review of a tryout as a Word document:
/// one table row per question (No | Soal | Pembahasan), with the correct
/// option in bold and marked with a check.
pub fn review_document(meta: &ExportMeta, questions: &[Question]) -> Docx {
    let mut doc = Docx::new()
        .add_paragraph(
            Paragraph::new().add_run(
                Run::new()
                    .add_text(meta.tryout_name.as_str())
                    .bold()
                    .size(TITLE_SIZE),
            ),
        )
        .add_paragraph(text_paragraph(&format!(
            "Durasi: {}",
            format_minutes_readable(meta.duration_minutes)
        )));
    if let Some(grade) = &meta.grade {
        doc = doc.add_paragraph(text_paragraph(&format!("Nilai: {}", grade)));
    }

    let mut rows = vec![TableRow::new(vec![
        header_cell("No"),
        header_cell("Soal"),
        header_cell("Pembahasan"),
    ])];
    rows.extend(questions.iter().enumerate().map(|(i, question)| {
        TableRow::new(vec![
            DocxCell::new().add_paragraph(text_paragraph(&(i + 1).to_string())),
            question_cell(question),
            explanation_cell(question),
        ])
    }));

    doc.add_table(DocxTable::new(rows))
}

/// Writes the review document to `path` as `.docx`.
pub fn write_review(path: &Path, meta: &ExportMeta, questions: &[Question]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        tracing::error!("Failed to create review export {:?}: {:?}", path, e);
        e
    })?;
    review_document(meta, questions)
        .build()
        .pack(file)
        .map_err(|e| {
            tracing::error!("Failed to pack review export {:?}: {:?}", path, e);
            AppError::Io(e.to_string())
        })?;
    tracing::info!("Review exported to {:?} ({} questions)", path, questions.len());
    Ok(())
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn header_cell(title: &str) -> DocxCell {
    DocxCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(title).bold()))
}

fn question_cell(question: &Question) -> DocxCell {
    let correct = question.answer_key.as_deref().and_then(normalize_key);

    let mut cell = DocxCell::new().add_paragraph(text_paragraph(&plain_text(&question.text)));
    if let Some(image) = &question.image {
        cell = cell.add_paragraph(text_paragraph(&format!("[Gambar: {}]", image)));
    }
    if let Some(table) = &question.table {
        cell = with_table(cell, table);
    }

    for option in &question.options {
        let label = format!(
            "{}. {}",
            option.letter.as_char().to_ascii_uppercase(),
            plain_text(&option.text)
        );
        let paragraph = if correct == Some(option.letter) {
            Paragraph::new().add_run(Run::new().add_text(format!("{} ✓", label)).bold())
        } else {
            text_paragraph(&label)
        };
        cell = cell.add_paragraph(paragraph);
    }
    cell
}

fn explanation_cell(question: &Question) -> DocxCell {
    let explanation = question
        .explanation
        .as_deref()
        .map(plain_text)
        .unwrap_or_else(|| "-".to_string());

    let mut cell = DocxCell::new().add_paragraph(text_paragraph(&explanation));
    if let Some(image) = &question.explanation_image {
        cell = cell.add_paragraph(text_paragraph(&format!("[Gambar: {}]", image)));
    }
    if let Some(table) = &question.explanation_table {
        cell = with_table(cell, table);
    }
    cell
}

/// Nests a question table inside a cell. A cell must end with a paragraph.
fn with_table(cell: DocxCell, table: &Table) -> DocxCell {
    let mut rows = Vec::new();
    if !table.headers.is_empty() {
        rows.push(TableRow::new(
            table.headers.iter().map(|h| header_cell(h)).collect(),
        ));
    }
    for row in &table.rows {
        rows.push(TableRow::new(
            row.iter()
                .map(|c| {
                    DocxCell::new()
                        .add_paragraph(text_paragraph(&plain_text(&c.value)))
                        .grid_span(c.colspan.max(1) as usize)
                })
                .collect(),
        ));
    }
    cell.add_table(DocxTable::new(rows))
        .add_paragraph(Paragraph::new())
}
