//! PRD drafting engine: extracts structured sections from Markdown PRDs
//! and persists them as versioned, owner-scoped documents in SQLite.

pub mod assemble;
pub mod draft;
pub mod errors;
pub mod extract;
pub mod model;
pub mod store;

pub use assemble::{assemble, decode_fields};
pub use draft::{Drafter, PrdEngine, SavedDraft, SectionRevision};
pub use errors::PrdError;
pub use extract::{parse_document, parse_section};
pub use model::{
    FieldMap, PrdDocument, RawStory, Row, Section, SectionKind, SectionValue, Story, StoryRecord,
    Timeline,
};
pub use store::{DbHandle, PrdDb};
