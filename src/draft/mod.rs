//! Drafting engine: turns a feature request into a persisted, structured
//! PRD by prompting a drafter for Markdown and running the extractor over
//! the result.

pub mod prompts;

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::errors::PrdError;
use crate::extract::{parse_document, parse_section};
use crate::model::{FieldMap, Section, SectionValue};
use crate::store::DbHandle;

/// Abstraction over the model that writes PRD prose.
/// Real implementations call out to an LLM; tests script responses.
#[async_trait]
pub trait Drafter: Send + Sync {
    /// Produce Markdown for the given system prompt and request.
    async fn draft(&self, system_prompt: &str, request: &str) -> anyhow::Result<String>;
}

/// A freshly drafted and persisted document.
#[derive(Debug)]
pub struct SavedDraft {
    pub document_id: Uuid,
    pub version: i64,
    pub sections: FieldMap,
    pub markdown: String,
}

/// Result of revising one section of an existing document.
#[derive(Debug)]
pub struct SectionRevision {
    pub document_id: Uuid,
    pub section: Section,
    pub version: i64,
    pub value: SectionValue,
}

/// Orchestrates drafting, extraction, and persistence.
pub struct PrdEngine {
    drafter: Arc<dyn Drafter>,
    store: DbHandle,
}

impl PrdEngine {
    pub fn new(drafter: Arc<dyn Drafter>, store: DbHandle) -> Self {
        Self { drafter, store }
    }

    /// Draft a full PRD for `feature` and persist it under `owner_id`.
    ///
    /// Passing an existing `document_id` regenerates that document in
    /// place and bumps its version; `None` creates a new document.
    pub async fn create(
        &self,
        owner_id: &str,
        feature: &str,
        document_id: Option<Uuid>,
    ) -> Result<SavedDraft, PrdError> {
        if owner_id.trim().is_empty() {
            return Err(PrdError::validation("owner_id"));
        }
        if feature.trim().is_empty() {
            return Err(PrdError::validation("feature"));
        }

        let request = format!(
            "Use the exact structure above to create a PRD. \
             Populate every section with realistic, specific details. \
             Feature request: {}",
            feature
        );
        let markdown = self
            .drafter
            .draft(prompts::PRD_SYSTEM_PROMPT, &request)
            .await
            .map_err(PrdError::Draft)?;

        let sections = parse_document(&markdown);
        if sections.is_empty() {
            return Err(PrdError::Draft(anyhow!(
                "drafted document contains no recognizable sections"
            )));
        }

        let owner = owner_id.to_string();
        let feature_name = feature.to_string();
        let persisted = sections.clone();
        let (id, version) = self
            .store
            .call(move |db| {
                let id = db.save(document_id, &owner, &feature_name, &persisted)?;
                let doc = db.get_document(&id, &owner)?;
                Ok((id, doc.version))
            })
            .await?;

        info!(document_id = %id, version, sections = sections.len(), "drafted document");
        Ok(SavedDraft {
            document_id: id,
            version,
            sections,
            markdown,
        })
    }

    /// Revise one section of an existing document from natural-language
    /// feedback. The drafter sees the current section content and the
    /// feedback, and only the target column plus the version counter are
    /// rewritten.
    pub async fn revise_section(
        &self,
        owner_id: &str,
        document_id: Uuid,
        section: Section,
        feedback: &str,
    ) -> Result<SectionRevision, PrdError> {
        if feedback.trim().is_empty() {
            return Err(PrdError::validation("feedback"));
        }

        // Also verifies the document exists and belongs to the caller
        // before spending a drafter call.
        let current = self
            .store
            .get_section(document_id, owner_id.to_string(), section)
            .await?;
        let current_json = match &current {
            Some(value) => serde_json::to_string_pretty(value)
                .map_err(|e| PrdError::Draft(anyhow!("Failed to encode current section: {}", e)))?,
            None => "(empty)".to_string(),
        };

        let request = format!(
            "CURRENT '{}' SECTION:\n{}\n\nUSER FEEDBACK: {}\n\n\
             Output the revised section body in Markdown.",
            section, current_json, feedback
        );
        let text = self
            .drafter
            .draft(&prompts::section_update_prompt(section), &request)
            .await
            .map_err(PrdError::Draft)?;

        let value = parse_section(section, &text);
        if value.is_empty() {
            return Err(PrdError::Draft(anyhow!(
                "drafter returned no usable content for {}",
                section
            )));
        }

        let version = self
            .store
            .update_section(document_id, owner_id.to_string(), section, value.clone())
            .await?;

        info!(document_id = %document_id, section = %section, version, "revised section");
        Ok(SectionRevision {
            document_id,
            section,
            version,
            value,
        })
    }
}
