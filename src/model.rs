//! Canonical document model: sections, their declared shapes, and the
//! full document record returned by the store.
//!
//! A section is either entirely absent or a value of its declared shape.
//! Parsers that cannot produce the expected shape fall back to a documented
//! degenerate value (single-item list, raw text, `{raw: ...}` story); a
//! partial or malformed shape is never stored.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PrdError;

/// A table row keyed by normalized column header.
pub type Row = BTreeMap<String, String>;

/// Ordered map from canonical section to its value.
pub type FieldMap = BTreeMap<Section, SectionValue>;

/// The fixed set of canonical document sections.
///
/// `as_str` names double as storage column names and as the external
/// field identifiers callers use; both must remain stable for round-trip
/// compatibility with previously stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Introduction,
    UserStories,
    FunctionalRequirements,
    NonFunctionalRequirements,
    Assumptions,
    Dependencies,
    RisksAndMitigations,
    Timeline,
    Stakeholders,
    Metrics,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Self::Introduction,
        Self::UserStories,
        Self::FunctionalRequirements,
        Self::NonFunctionalRequirements,
        Self::Assumptions,
        Self::Dependencies,
        Self::RisksAndMitigations,
        Self::Timeline,
        Self::Stakeholders,
        Self::Metrics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::UserStories => "user_stories",
            Self::FunctionalRequirements => "functional_requirements",
            Self::NonFunctionalRequirements => "non_functional_requirements",
            Self::Assumptions => "assumptions",
            Self::Dependencies => "dependencies",
            Self::RisksAndMitigations => "risks_and_mitigations",
            Self::Timeline => "timeline",
            Self::Stakeholders => "stakeholders",
            Self::Metrics => "metrics",
        }
    }

    /// The declared shape of this section's value.
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Introduction => SectionKind::Text,
            Self::UserStories => SectionKind::Stories,
            Self::RisksAndMitigations => SectionKind::Rows,
            Self::Timeline => SectionKind::Timeline,
            _ => SectionKind::Items,
        }
    }

    /// Decode an arbitrary JSON value into this section's declared shape.
    ///
    /// Used for caller-supplied pre-structured values and for values read
    /// back from storage, so a malformed shape surfaces immediately instead
    /// of leaking into the field map.
    pub fn decode_value(&self, value: serde_json::Value) -> Result<SectionValue, PrdError> {
        let decoded = match self.kind() {
            SectionKind::Text => serde_json::from_value::<String>(value).map(SectionValue::Text),
            SectionKind::Items => {
                serde_json::from_value::<Vec<String>>(value).map(SectionValue::Items)
            }
            SectionKind::Rows => serde_json::from_value::<Vec<Row>>(value).map(SectionValue::Rows),
            SectionKind::Stories => {
                serde_json::from_value::<Vec<Story>>(value).map(SectionValue::Stories)
            }
            // Timeline accepts either the composite shape or the raw-text
            // fallback the parser produces when no table is found.
            SectionKind::Timeline => serde_json::from_value::<Timeline>(value.clone())
                .map(SectionValue::Timeline)
                .or_else(|_| serde_json::from_value::<String>(value).map(SectionValue::Text)),
        };
        decoded.map_err(|_| PrdError::validation(self.as_str()))
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    /// Resolves canonical names first, then heading-style aliases
    /// ("Risks and Mitigations", "Functional Requirements (core features)").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introduction" => Ok(Self::Introduction),
            "user_stories" => Ok(Self::UserStories),
            "functional_requirements" => Ok(Self::FunctionalRequirements),
            "non_functional_requirements" => Ok(Self::NonFunctionalRequirements),
            "assumptions" => Ok(Self::Assumptions),
            "dependencies" => Ok(Self::Dependencies),
            "risks_and_mitigations" => Ok(Self::RisksAndMitigations),
            "timeline" => Ok(Self::Timeline),
            "stakeholders" => Ok(Self::Stakeholders),
            "metrics" => Ok(Self::Metrics),
            other => crate::extract::heading::classify_heading(other)
                .ok_or_else(|| format!("Unsupported section: {}", other)),
        }
    }
}

/// Shape classes a section value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Text,
    Items,
    Rows,
    Timeline,
    Stories,
}

/// A section's value in its declared shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Items(Vec<String>),
    Rows(Vec<Row>),
    Stories(Vec<Story>),
    Timeline(Timeline),
    Text(String),
}

impl SectionValue {
    /// Whether this value carries any content. Empty pre-structured values
    /// do not win the assembler's merge; empty parsed values are omitted.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Items(items) => items.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
            Self::Stories(stories) => stories.is_empty(),
            Self::Timeline(t) => t.phases.is_empty() && t.summary.is_none(),
        }
    }
}

/// Composite timeline shape: table-derived phases plus an optional
/// "Total: ..." summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub phases: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A user story: either fully decomposed sub-blocks, or the documented
/// opaque fallback when no sub-block was recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Story {
    Structured(StoryRecord),
    Raw(RawStory),
}

/// A decomposed user story. `id` is 1-based appearance order within the
/// document; the number in the `### User Story N` heading is informational
/// only and does not override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exception_handling: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definition_of_done: Vec<String>,
}

impl StoryRecord {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            description: None,
            actors: Vec::new(),
            pre_conditions: Vec::new(),
            flow: Vec::new(),
            exception_handling: Vec::new(),
            acceptance_criteria: Vec::new(),
            definition_of_done: Vec::new(),
        }
    }

    /// True when no sub-block contributed anything.
    pub fn is_blank(&self) -> bool {
        self.description.is_none()
            && self.actors.is_empty()
            && self.pre_conditions.is_empty()
            && self.flow.is_empty()
            && self.exception_handling.is_empty()
            && self.acceptance_criteria.is_empty()
            && self.definition_of_done.is_empty()
    }
}

/// Terminal shape for a story block that could not be decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStory {
    pub raw: String,
}

/// A full document as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrdDocument {
    pub id: uuid::Uuid,
    pub owner_id: String,
    pub feature: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub sections: FieldMap,
}
