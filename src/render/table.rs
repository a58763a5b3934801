// src/render/table.rs

use serde::{Deserialize, Serialize};

/// Table headers on the wire: either `"a|b|c"` or `["a", "b", "c"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireHeaders {
    Text(String),
    List(Vec<String>),
}

/// Table rows on the wire: either `"1|2;3^2"` or a JSON grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRows {
    Text(String),
    Grid(Vec<Vec<WireCell>>),
}

/// A JSON grid cell, plain or with an explicit span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireCell {
    Text(String),
    Spanned {
        value: String,
        #[serde(default)]
        colspan: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub value: String,
    /// Number of columns the cell covers, at least 1.
    pub colspan: u32,
}

impl TableCell {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            colspan: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}

/// Parses a single `value^span` cell. A missing, zero or unparseable span means 1.
pub fn parse_cell(raw: &str) -> TableCell {
    match raw.split_once('^') {
        Some((value, span)) => TableCell {
            value: value.trim().to_string(),
            colspan: span.trim().parse().ok().filter(|n| *n > 0).unwrap_or(1),
        },
        None => TableCell::plain(raw.trim()),
    }
}

pub fn parse_headers(headers: &WireHeaders) -> Vec<String> {
    match headers {
        WireHeaders::Text(s) => s.split('|').map(|h| h.trim().to_string()).collect(),
        WireHeaders::List(list) => list.clone(),
    }
}

/// Rows are `;`-separated records of `|`-separated cells. Blank records are dropped.
pub fn parse_rows(rows: &WireRows) -> Vec<Vec<TableCell>> {
    match rows {
        WireRows::Text(s) => s
            .split(';')
            .filter(|record| !record.trim().is_empty())
            .map(|record| record.split('|').map(parse_cell).collect())
            .collect(),
        WireRows::Grid(grid) => grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        WireCell::Text(s) => parse_cell(s),
                        WireCell::Spanned { value, colspan } => TableCell {
                            value: value.clone(),
                            colspan: colspan.filter(|n| *n > 0).unwrap_or(1),
                        },
                    })
                    .collect()
            })
            .collect(),
    }
}

/// A table exists only when both headers and rows are present and non-blank.
pub fn parse_table(headers: Option<&WireHeaders>, rows: Option<&WireRows>) -> Option<Table> {
    let headers = headers.filter(|h| !is_blank_headers(h))?;
    let rows = rows.filter(|r| !is_blank_rows(r))?;

    Some(Table {
        headers: parse_headers(headers),
        rows: parse_rows(rows),
    })
}

fn is_blank_headers(headers: &WireHeaders) -> bool {
    match headers {
        WireHeaders::Text(s) => s.trim().is_empty(),
        WireHeaders::List(list) => list.is_empty(),
    }
}

fn is_blank_rows(rows: &WireRows) -> bool {
    match rows {
        WireRows::Text(s) => s.trim().is_empty(),
        WireRows::Grid(grid) => grid.is_empty(),
    }
}
