//! Typed error hierarchy for the PRD engine.
//!
//! One top-level enum covers the whole crate: validation failures are
//! rejected before any I/O, lookup failures collapse "wrong id" and
//! "wrong owner" into a single `NotFound`, and storage failures wrap
//! their underlying cause. Degraded parses are never errors — every
//! sub-parser has a documented fallback shape instead.

use thiserror::Error;

/// Errors surfaced by the assembler, store, and engine operations.
#[derive(Debug, Error)]
pub enum PrdError {
    #[error("Missing required field '{field}'")]
    Validation { field: String },

    #[error("Unsupported section '{section}'")]
    SectionUnsupported { section: String },

    #[error("Document {document_id} not found")]
    NotFound { document_id: String },

    #[error("Storage error: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("Drafting failed: {0}")]
    Draft(#[source] anyhow::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl PrdError {
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation { field: field.into() }
    }

    pub fn unsupported(section: impl Into<String>) -> Self {
        Self::SectionUnsupported {
            section: section.into(),
        }
    }

    pub fn not_found(document_id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            document_id: document_id.to_string(),
        }
    }
}
