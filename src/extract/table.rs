//! Pipe-table and timeline sub-parsers.

use crate::model::{Row, SectionValue, Timeline};

/// Split a pipe-delimited line into trimmed cells, dropping the empty
/// leading/trailing fragments produced by boundary pipes.
fn split_cells(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// A separator row's cells consist solely of dashes once pipes and spaces
/// are stripped.
fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|cell| !cell.is_empty() && cell.chars().all(|c| c == '-'))
}

/// Normalize a header cell into a row-map key: lowercase, non-alphanumeric
/// runs to a single underscore, trimmed.
fn normalize_header(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut pending = false;
    for ch in cell.chars() {
        if ch.is_alphanumeric() {
            if pending && !out.is_empty() {
                out.push('_');
            }
            pending = false;
            out.extend(ch.to_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// Parse a Markdown pipe table into an ordered list of row-maps keyed by
/// normalized header.
///
/// The first pipe line is the header and a dash-only separator row must
/// appear for the table to count at all. Rows that are not separators are
/// data; a data row is kept only when its cell count equals the header's,
/// mismatched rows are silently dropped.
pub fn parse_table(text: &str) -> Vec<Row> {
    let mut header: Option<Vec<String>> = None;
    let mut saw_separator = false;
    let mut rows = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            continue;
        }
        let cells = split_cells(trimmed);
        match &header {
            None => {
                header = Some(cells.iter().map(|c| normalize_header(c)).collect());
            }
            Some(keys) => {
                if is_separator(&cells) {
                    saw_separator = true;
                    continue;
                }
                if cells.len() == keys.len() {
                    rows.push(keys.iter().cloned().zip(cells).collect::<Row>());
                }
            }
        }
    }

    if !saw_separator {
        return Vec::new();
    }
    rows
}

/// Parse a timeline block: a phase table plus an optional summary line.
///
/// When the table yields rows, the remaining non-table lines are scanned
/// for one starting with "total" (case-insensitive); the text after its
/// first colon becomes the summary. With no table at all, the whole block
/// degrades to its trimmed raw text.
pub fn parse_timeline(text: &str) -> SectionValue {
    let phases = parse_table(text);
    if phases.is_empty() {
        return SectionValue::Text(text.trim().to_string());
    }

    let mut summary = None;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            continue;
        }
        if trimmed
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("total"))
        {
            if let Some(idx) = trimmed.find(':') {
                let rest = trimmed[idx + 1..].trim();
                if !rest.is_empty() {
                    summary = Some(rest.to_string());
                    break;
                }
            }
        }
    }

    SectionValue::Timeline(Timeline { phases, summary })
}
