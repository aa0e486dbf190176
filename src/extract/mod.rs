//! Markdown extraction: canonical sections out of model-drafted text.
//!
//! The splitter partitions a document into heading-bounded blocks, the
//! heading classifier routes each block to a canonical section, and the
//! field sub-parsers turn block text into the section's declared shape.
//! Every sub-parser degrades instead of failing; extraction never errors.

pub mod blocks;
pub mod heading;
pub mod lists;
pub mod story;
pub mod table;

use crate::model::{FieldMap, Section, SectionKind, SectionValue};

/// Parse one section's body text into its declared shape.
pub fn parse_section(section: Section, text: &str) -> SectionValue {
    match section.kind() {
        SectionKind::Text => SectionValue::Text(text.trim().to_string()),
        SectionKind::Items => SectionValue::Items(lists::parse_bullets(text)),
        SectionKind::Rows => SectionValue::Rows(table::parse_table(text)),
        SectionKind::Timeline => table::parse_timeline(text),
        SectionKind::Stories => SectionValue::Stories(story::parse_stories(text)),
    }
}

/// Parse a full Markdown document into a canonical field map.
///
/// Unknown headings are dropped; sections whose parse carries no content
/// are omitted, so the map holds only absent-or-shaped values.
pub fn parse_document(text: &str) -> FieldMap {
    let mut map = FieldMap::new();
    for (section, span) in blocks::split_blocks(text, 2, heading::classify_heading) {
        let value = parse_section(section, &span);
        if !value.is_empty() {
            map.insert(section, value);
        }
    }
    map
}
