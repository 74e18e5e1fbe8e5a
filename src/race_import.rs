//! Pasted or uploaded race calendars: one race per line, tab or comma
//! separated, columns Date, Type, Name and an optional Link.

use serde::{Deserialize, Serialize};

use crate::dates::normalize_date;

/// Lowercase fragments that mark the first line as a column header
/// (English and Slovenian column names).
const HEADER_MARKERS: &[&str] = &["date", "datum", "type", "tip", "vrsta"];

/// One validated race line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type", default)]
    pub race_type: String,
    pub name: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub line_number: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchResult {
    pub rows: Vec<ImportRow>,
    pub parse_errors: Vec<RowError>,
}

impl ImportBatchResult {
    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}

/// Parse a whole race table. Bad lines are reported and skipped; they never
/// stop the remaining lines from being read.
pub fn parse_race_table(text: &str) -> ImportBatchResult {
    let mut result = ImportBatchResult::default();

    let mut lines = text
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .peekable();

    if let Some((_, first)) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    for (line_number, line) in lines {
        match parse_line(line_number, line) {
            Ok(row) => result.rows.push(row),
            Err(message) => {
                tracing::debug!(line_number, %message, "rejected race row");
                result.parse_errors.push(RowError {
                    line_number,
                    message,
                });
            }
        }
    }

    tracing::debug!(
        rows = result.rows.len(),
        errors = result.parse_errors.len(),
        "parsed race table"
    );
    result
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn parse_line(line_number: usize, line: &str) -> Result<ImportRow, String> {
    let fields = split_fields(line);
    if fields.len() < 3 {
        return Err(format!(
            "Row {line_number}: Not enough columns (need at least Date, Type, Name)"
        ));
    }

    let raw_date = &fields[0];
    let date = normalize_date(raw_date).ok_or_else(|| {
        format!("Row {line_number}: Invalid date format \"{raw_date}\" (expected DD.MM.YYYY)")
    })?;

    let name = fields[2].clone();
    if name.is_empty() {
        return Err(format!("Row {line_number}: Name is required"));
    }

    Ok(ImportRow {
        date,
        race_type: fields[1].clone(),
        name,
        link: fields.get(3).cloned().unwrap_or_default(),
    })
}

/// Split one line into trimmed fields. Tabs win when present; otherwise
/// commas separate fields except inside a double-quoted span. Quote
/// characters are dropped from the values.
pub fn split_fields(line: &str) -> Vec<String> {
    if line.contains('\t') {
        return line.split('\t').map(|f| f.trim().to_string()).collect();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
