//! Record model and the JSON-file-backed vector store.
//!
//! A [`Record`] is the persisted, searchable unit: chunk text, its embedding,
//! and the metadata describing where the chunk came from. Records are
//! append-only — updates happen as remove-and-insert, never in place.

pub mod json;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use json::{JsonVectorStore, ReplaceOutcome, cosine_similarity};

/// Which corpus a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Website,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pdf => f.write_str("pdf"),
            SourceKind::Website => f.write_str("website"),
        }
    }
}

/// Provenance of one stored chunk.
///
/// Serialized with camelCase keys so the on-disk store file stays
/// human-diffable in the shape downstream tooling already reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub source: SourceKind,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    pub chunk_index: usize,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl RecordMetadata {
    /// Metadata for a chunk extracted from a crawled page.
    pub fn website(
        url: impl Into<String>,
        title: impl Into<String>,
        chunk_index: usize,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            source: SourceKind::Website,
            file_name: None,
            url: Some(url.into()),
            title: Some(title.into()),
            page: None,
            chunk_index,
            last_updated: Some(last_updated),
        }
    }

    /// Metadata for a chunk extracted from a paginated file.
    pub fn pdf(file_name: impl Into<String>, page: u32, chunk_index: usize) -> Self {
        Self {
            source: SourceKind::Pdf,
            file_name: Some(file_name.into()),
            url: None,
            title: None,
            page: Some(page),
            chunk_index,
            last_updated: None,
        }
    }
}

/// A chunk plus its embedding vector and provenance, as stored.
///
/// `embedding.len()` is constant across every record in one store; the store
/// rejects mixed dimensionalities because similarity across them is
/// meaningless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Per-source corpus statistics, for observability endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceStats {
    pub records: usize,
    pub urls: BTreeSet<String>,
    pub files: BTreeSet<String>,
}
