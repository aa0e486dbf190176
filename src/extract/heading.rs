//! Heading classification against the canonical hint table.
//!
//! Model output is free-form Markdown; headings arrive with arbitrary
//! casing, punctuation, and trailing qualifiers ("Functional Requirements
//! (core features)"). Classification normalizes the heading and matches it
//! exactly or by word-bounded prefix against a fixed hint table. Unknown
//! headings classify to nothing and their content is dropped upstream.

use crate::model::Section;

/// Normalized hint -> canonical section. Hints must stay prefix-unique:
/// no hint may be a word-prefix of another hint mapping to a different
/// section (enforced by `hint_table_is_prefix_unique` below).
const HINTS: &[(&str, Section)] = &[
    ("introduction", Section::Introduction),
    ("user stories", Section::UserStories),
    ("functional requirements", Section::FunctionalRequirements),
    ("non functional requirements", Section::NonFunctionalRequirements),
    ("assumptions", Section::Assumptions),
    ("dependencies", Section::Dependencies),
    ("risks and mitigations", Section::RisksAndMitigations),
    ("risks mitigations", Section::RisksAndMitigations),
    ("timeline", Section::Timeline),
    ("stakeholders", Section::Stakeholders),
    ("metrics", Section::Metrics),
    ("success metrics", Section::Metrics),
    ("key metrics", Section::Metrics),
];

/// Lowercase a heading and collapse every non-alphanumeric run to a single
/// space, trimming the ends.
pub(crate) fn normalize_heading(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Map a raw heading to a canonical section, or `None` for no match.
pub fn classify_heading(raw: &str) -> Option<Section> {
    let normalized = normalize_heading(raw);
    if normalized.is_empty() {
        return None;
    }
    for (hint, section) in HINTS {
        if matches_hint(&normalized, hint) {
            return Some(*section);
        }
    }
    None
}

/// Exact match, or the hint followed by more words ("functional
/// requirements core features"). No fuzzy matching beyond that.
fn matches_hint(normalized: &str, hint: &str) -> bool {
    normalized == hint
        || normalized
            .strip_prefix(hint)
            .is_some_and(|rest| rest.starts_with(' '))
}
