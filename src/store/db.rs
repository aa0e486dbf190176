//! SQLite-backed versioned document store.
//!
//! Every read and write is scoped by the document's immutable `owner_id`;
//! a matching id under the wrong owner surfaces as `NotFound`, identical
//! to a missing row. The version column increases by exactly one per
//! completed write, whether full upsert or section-scoped. The storage
//! transaction is the unit of atomicity; concurrent writers against the
//! same document each read their own version snapshot, so a lost update
//! between two section writers is possible and intentionally not
//! prevented here.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::errors::PrdError;
use crate::model::{FieldMap, PrdDocument, Section, SectionKind, SectionValue};

/// Async-safe handle to the document store.
///
/// Wraps `PrdDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous
/// SQLite I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<PrdDb>>,
}

impl DbHandle {
    pub fn new(db: PrdDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R, PrdError>
    where
        F: FnOnce(&PrdDb) -> Result<R, PrdError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| PrdError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| PrdError::Persistence(anyhow!("store task panicked: {}", e)))?
    }

    /// Full upsert of a document; returns the effective document id.
    pub async fn save(
        &self,
        document_id: Option<Uuid>,
        owner_id: String,
        feature: String,
        sections: FieldMap,
    ) -> Result<Uuid, PrdError> {
        self.call(move |db| db.save(document_id, &owner_id, &feature, &sections))
            .await
    }

    /// Replace one section's value; returns the new version.
    pub async fn update_section(
        &self,
        document_id: Uuid,
        owner_id: String,
        section: Section,
        value: SectionValue,
    ) -> Result<i64, PrdError> {
        self.call(move |db| db.update_section(&document_id, &owner_id, section, &value))
            .await
    }

    /// Read one section's value; `None` when the section is unpopulated.
    pub async fn get_section(
        &self,
        document_id: Uuid,
        owner_id: String,
        section: Section,
    ) -> Result<Option<SectionValue>, PrdError> {
        self.call(move |db| db.get_section(&document_id, &owner_id, section))
            .await
    }

    /// Read the full document, field map plus version and timestamps.
    pub async fn get_document(
        &self,
        document_id: Uuid,
        owner_id: String,
    ) -> Result<PrdDocument, PrdError> {
        self.call(move |db| db.get_document(&document_id, &owner_id))
            .await
    }
}

pub struct PrdDb {
    conn: Connection,
}

const DOCUMENT_COLUMNS: &str = "id, owner_id, feature, version, created_at, updated_at, \
     introduction, user_stories, functional_requirements, non_functional_requirements, \
     assumptions, dependencies, risks_and_mitigations, timeline, stakeholders, metrics";

impl PrdDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self, PrdError> {
        let conn = Connection::open(path)
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to open SQLite database: {}", e)))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self, PrdError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PrdError::Persistence(anyhow!("Failed to open in-memory SQLite database: {}", e))
        })?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), PrdError> {
        self.run_migrations()
    }

    fn run_migrations(&self) -> Result<(), PrdError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS prds (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    feature TEXT NOT NULL,
                    version INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    introduction TEXT,
                    user_stories TEXT,
                    functional_requirements TEXT,
                    non_functional_requirements TEXT,
                    assumptions TEXT,
                    dependencies TEXT,
                    risks_and_mitigations TEXT,
                    timeline TEXT,
                    stakeholders TEXT,
                    metrics TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_prds_owner ON prds(owner_id);
                ",
            )
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    /// Full upsert: assign or bump the version and replace the whole row.
    ///
    /// Sections absent from the map are written as NULL. With an id that
    /// already belongs to a different owner the call fails `NotFound`
    /// rather than reassigning the row — `owner_id` is immutable.
    pub fn save(
        &self,
        document_id: Option<Uuid>,
        owner_id: &str,
        feature: &str,
        sections: &FieldMap,
    ) -> Result<Uuid, PrdError> {
        if owner_id.trim().is_empty() {
            return Err(PrdError::validation("owner_id"));
        }
        if feature.trim().is_empty() {
            return Err(PrdError::validation("feature"));
        }

        let mut columns: Vec<Option<String>> = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            columns.push(match sections.get(&section) {
                Some(value) => Some(serde_json::to_string(value).map_err(|e| {
                    PrdError::Persistence(anyhow!("Failed to encode {}: {}", section, e))
                })?),
                None => None,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to begin transaction: {}", e)))?;

        let id = document_id.unwrap_or_else(Uuid::new_v4);
        let existing: Option<(String, i64, String)> = tx
            .query_row(
                "SELECT owner_id, version, created_at FROM prds WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to read current version: {}", e)))?;

        let (version, created_at) = match existing {
            Some((row_owner, current, created)) if row_owner == owner_id => (current + 1, created),
            Some(_) => return Err(PrdError::not_found(id)),
            None => (1, now.clone()),
        };

        tx.execute(
            "INSERT OR REPLACE INTO prds (id, owner_id, feature, version, created_at, updated_at, \
             introduction, user_stories, functional_requirements, non_functional_requirements, \
             assumptions, dependencies, risks_and_mitigations, timeline, stakeholders, metrics) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                id.to_string(),
                owner_id,
                feature,
                version,
                created_at,
                now,
                columns[0],
                columns[1],
                columns[2],
                columns[3],
                columns[4],
                columns[5],
                columns[6],
                columns[7],
                columns[8],
                columns[9],
            ],
        )
        .map_err(|e| PrdError::Persistence(anyhow!("Failed to upsert document: {}", e)))?;

        tx.commit()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to commit upsert: {}", e)))?;

        debug!(document_id = %id, version, "saved document");
        Ok(id)
    }

    /// Section-scoped read-modify-write: replaces exactly one section
    /// column plus the version counter, leaving every other column alone.
    pub fn update_section(
        &self,
        document_id: &Uuid,
        owner_id: &str,
        section: Section,
        value: &SectionValue,
    ) -> Result<i64, PrdError> {
        if owner_id.trim().is_empty() {
            return Err(PrdError::validation("owner_id"));
        }
        if !value_matches_kind(section, value) {
            return Err(PrdError::validation(section.as_str()));
        }

        let json = serde_json::to_string(value)
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to encode {}: {}", section, e)))?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to begin transaction: {}", e)))?;

        let current: Option<i64> = tx
            .query_row(
                "SELECT version FROM prds WHERE id = ?1 AND owner_id = ?2",
                params![document_id.to_string(), owner_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to read current version: {}", e)))?;

        let Some(current) = current else {
            return Err(PrdError::not_found(document_id));
        };
        let new_version = current + 1;

        // Column names come from Section::as_str, a fixed table.
        tx.execute(
            &format!(
                "UPDATE prds SET {} = ?1, version = ?2, updated_at = ?3 \
                 WHERE id = ?4 AND owner_id = ?5",
                section.as_str()
            ),
            params![json, new_version, now, document_id.to_string(), owner_id],
        )
        .map_err(|e| PrdError::Persistence(anyhow!("Failed to update {}: {}", section, e)))?;

        tx.commit()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to commit section update: {}", e)))?;

        debug!(document_id = %document_id, section = %section, new_version, "updated section");
        Ok(new_version)
    }

    /// Read one section; `None` when the row exists but the section was
    /// never populated.
    pub fn get_section(
        &self,
        document_id: &Uuid,
        owner_id: &str,
        section: Section,
    ) -> Result<Option<SectionValue>, PrdError> {
        let stored: Option<Option<String>> = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM prds WHERE id = ?1 AND owner_id = ?2",
                    section.as_str()
                ),
                params![document_id.to_string(), owner_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to query {}: {}", section, e)))?;

        match stored {
            None => Err(PrdError::not_found(document_id)),
            Some(None) => Ok(None),
            Some(Some(json)) => decode_column(section, &json).map(Some),
        }
    }

    /// Read the full document.
    pub fn get_document(
        &self,
        document_id: &Uuid,
        owner_id: &str,
    ) -> Result<PrdDocument, PrdError> {
        let row: Option<DocumentRow> = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM prds WHERE id = ?1 AND owner_id = ?2",
                    DOCUMENT_COLUMNS
                ),
                params![document_id.to_string(), owner_id],
                |row| {
                    let mut columns = Vec::with_capacity(Section::ALL.len());
                    for i in 0..Section::ALL.len() {
                        columns.push(row.get::<_, Option<String>>(6 + i)?);
                    }
                    Ok(DocumentRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        feature: row.get(2)?,
                        version: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                        columns,
                    })
                },
            )
            .optional()
            .map_err(|e| PrdError::Persistence(anyhow!("Failed to query document: {}", e)))?;

        match row {
            None => Err(PrdError::not_found(document_id)),
            Some(r) => r.into_document(),
        }
    }
}

/// The value shape a section column accepts; timeline also accepts the
/// raw-text fallback.
fn value_matches_kind(section: Section, value: &SectionValue) -> bool {
    match (section.kind(), value) {
        (SectionKind::Text, SectionValue::Text(_)) => true,
        (SectionKind::Items, SectionValue::Items(_)) => true,
        (SectionKind::Rows, SectionValue::Rows(_)) => true,
        (SectionKind::Stories, SectionValue::Stories(_)) => true,
        (SectionKind::Timeline, SectionValue::Timeline(_) | SectionValue::Text(_)) => true,
        _ => false,
    }
}

fn decode_column(section: Section, json: &str) -> Result<SectionValue, PrdError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        PrdError::Persistence(anyhow!("corrupt {} JSON '{}': {}", section, json, e))
    })?;
    section
        .decode_value(value)
        .map_err(|_| PrdError::Persistence(anyhow!("stored {} value has the wrong shape", section)))
}

/// Intermediate row struct for reading documents from SQLite before
/// decoding section columns into typed values.
struct DocumentRow {
    id: String,
    owner_id: String,
    feature: String,
    version: i64,
    created_at: String,
    updated_at: String,
    columns: Vec<Option<String>>,
}

impl DocumentRow {
    fn into_document(self) -> Result<PrdDocument, PrdError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| PrdError::Persistence(anyhow!("corrupt document id '{}': {}", self.id, e)))?;
        let mut sections = FieldMap::new();
        for (section, column) in Section::ALL.into_iter().zip(self.columns) {
            if let Some(json) = column {
                sections.insert(section, decode_column(section, &json)?);
            }
        }
        Ok(PrdDocument {
            id,
            owner_id: self.owner_id,
            feature: self.feature,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sections,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn items(values: &[&str]) -> SectionValue {
        SectionValue::Items(values.iter().map(|s| s.to_string()).collect())
    }

    fn sample_sections() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(
            Section::Introduction,
            SectionValue::Text("One-click checkout.".into()),
        );
        map.insert(Section::Assumptions, items(&["Managed Postgres"]));
        map.insert(Section::Stakeholders, items(&["PM"]));
        map
    }

    /// Raw column text straight from SQLite, bypassing typed decoding.
    fn raw_column(db: &PrdDb, id: &Uuid, section: Section) -> Option<String> {
        db.conn
            .query_row(
                &format!("SELECT {} FROM prds WHERE id = ?1", section.as_str()),
                params![id.to_string()],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_save_new_document_is_version_one() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let doc = db.get_document(&id, "u1").unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.owner_id, "u1");
        assert_eq!(doc.feature, "Checkout");
        assert_eq!(doc.sections.len(), 3);
    }

    #[test]
    fn test_save_existing_document_bumps_version() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let same = db
            .save(Some(id), "u1", "Checkout", &sample_sections())
            .unwrap();
        assert_eq!(same, id);
        assert_eq!(db.get_document(&id, "u1").unwrap().version, 2);
    }

    #[test]
    fn test_save_with_fresh_id_starts_at_version_one() {
        let db = PrdDb::new_in_memory().unwrap();
        let supplied = Uuid::new_v4();
        let id = db
            .save(Some(supplied), "u1", "Checkout", &sample_sections())
            .unwrap();
        assert_eq!(id, supplied);
        assert_eq!(db.get_document(&id, "u1").unwrap().version, 1);
    }

    #[test]
    fn test_save_replaces_absent_sections_with_null() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();

        let mut only_metrics = FieldMap::new();
        only_metrics.insert(Section::Metrics, items(&["DAU"]));
        db.save(Some(id), "u1", "Checkout", &only_metrics).unwrap();

        let doc = db.get_document(&id, "u1").unwrap();
        assert_eq!(doc.version, 2);
        assert!(doc.sections.contains_key(&Section::Metrics));
        assert!(!doc.sections.contains_key(&Section::Assumptions));
    }

    #[test]
    fn test_save_validates_before_io() {
        let db = PrdDb::new_in_memory().unwrap();
        assert!(matches!(
            db.save(None, "", "Checkout", &FieldMap::new()),
            Err(PrdError::Validation { .. })
        ));
        assert!(matches!(
            db.save(None, "u1", "   ", &FieldMap::new()),
            Err(PrdError::Validation { .. })
        ));
    }

    #[test]
    fn test_save_foreign_owned_id_is_not_found() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let err = db
            .save(Some(id), "u2", "Checkout", &sample_sections())
            .unwrap_err();
        assert!(matches!(err, PrdError::NotFound { .. }));
        // u1's row is untouched.
        assert_eq!(db.get_document(&id, "u1").unwrap().version, 1);
    }

    #[test]
    fn test_update_section_bumps_version_and_preserves_siblings() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        db.save(Some(id), "u1", "Checkout", &sample_sections())
            .unwrap();

        let intro_before = raw_column(&db, &id, Section::Introduction);
        let assumptions_before = raw_column(&db, &id, Section::Assumptions);

        let new_version = db
            .update_section(&id, "u1", Section::Stakeholders, &items(&["PM", "Legal"]))
            .unwrap();
        assert_eq!(new_version, 3);

        assert_eq!(raw_column(&db, &id, Section::Introduction), intro_before);
        assert_eq!(raw_column(&db, &id, Section::Assumptions), assumptions_before);
        assert_eq!(
            db.get_section(&id, "u1", Section::Stakeholders).unwrap(),
            Some(items(&["PM", "Legal"]))
        );
    }

    #[test]
    fn test_update_section_wrong_owner_is_not_found_and_no_write() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let stakeholders_before = raw_column(&db, &id, Section::Stakeholders);

        let err = db
            .update_section(&id, "u2", Section::Stakeholders, &items(&["Mallory"]))
            .unwrap_err();
        assert!(matches!(err, PrdError::NotFound { .. }));

        assert_eq!(db.get_document(&id, "u1").unwrap().version, 1);
        assert_eq!(raw_column(&db, &id, Section::Stakeholders), stakeholders_before);
    }

    #[test]
    fn test_update_section_rejects_wrong_shape() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let err = db
            .update_section(
                &id,
                "u1",
                Section::Introduction,
                &items(&["a list where text belongs"]),
            )
            .unwrap_err();
        assert!(matches!(err, PrdError::Validation { .. }));
    }

    #[test]
    fn test_update_section_timeline_accepts_raw_fallback() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        let v = db
            .update_section(
                &id,
                "u1",
                Section::Timeline,
                &SectionValue::Text("two quarters".into()),
            )
            .unwrap();
        assert_eq!(v, 2);
        assert_eq!(
            db.get_section(&id, "u1", Section::Timeline).unwrap(),
            Some(SectionValue::Text("two quarters".into()))
        );
    }

    #[test]
    fn test_get_section_unpopulated_is_none() {
        let db = PrdDb::new_in_memory().unwrap();
        let id = db.save(None, "u1", "Checkout", &sample_sections()).unwrap();
        assert_eq!(db.get_section(&id, "u1", Section::Metrics).unwrap(), None);
    }

    #[test]
    fn test_get_section_missing_row_is_not_found() {
        let db = PrdDb::new_in_memory().unwrap();
        let err = db
            .get_section(&Uuid::new_v4(), "u1", Section::Metrics)
            .unwrap_err();
        assert!(matches!(err, PrdError::NotFound { .. }));
    }

    #[test]
    fn test_document_roundtrips_every_section_kind() {
        let db = PrdDb::new_in_memory().unwrap();
        let mut map = FieldMap::new();
        map.insert(Section::Introduction, SectionValue::Text("intro".into()));
        map.insert(Section::Metrics, items(&["DAU"]));
        map.insert(
            Section::RisksAndMitigations,
            SectionValue::Rows(vec![[("risk".to_string(), "Churn".to_string())]
                .into_iter()
                .collect()]),
        );
        map.insert(
            Section::Timeline,
            SectionValue::Timeline(crate::model::Timeline {
                phases: vec![[("phase".to_string(), "Build".to_string())]
                    .into_iter()
                    .collect()],
                summary: Some("one quarter".into()),
            }),
        );
        map.insert(
            Section::UserStories,
            SectionValue::Stories(vec![crate::model::Story::Raw(crate::model::RawStory {
                raw: "opaque".into(),
            })]),
        );

        let id = db.save(None, "u1", "Checkout", &map).unwrap();
        let doc = db.get_document(&id, "u1").unwrap();
        assert_eq!(doc.sections, map);
    }

    #[tokio::test]
    async fn test_db_handle_save_and_update() {
        let handle = DbHandle::new(PrdDb::new_in_memory().unwrap());
        let id = handle
            .save(None, "u1".into(), "Checkout".into(), sample_sections())
            .await
            .unwrap();
        let version = handle
            .update_section(id, "u1".into(), Section::Metrics, items(&["DAU"]))
            .await
            .unwrap();
        assert_eq!(version, 2);
        let doc = handle.get_document(id, "u1".into()).await.unwrap();
        assert_eq!(doc.version, 2);
    }
}
