//! File-text extraction seam and directory ingestion.
//!
//! Format-specific extraction (PDF parsing in production) is an external
//! collaborator behind [`TextExtractor`]; the engine only sees the recovered
//! text. [`ingest_directory`] feeds a knowledge base from a drop folder,
//! processing each file at most once across restarts by checking the file
//! names already present in store metadata.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use super::pipeline::IngestionPipeline;
use crate::stores::JsonVectorStore;
use crate::types::RagError;

/// Recovers plain text from a document file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, RagError>;
}

/// Extractor for files that already contain UTF-8 text. Useful for tests and
/// pre-converted corpora; production deployments plug a real PDF parser in
/// behind the same trait.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, RagError> {
        let bytes = fs::read(path).await?;
        String::from_utf8(bytes).map_err(|err| RagError::Extraction(err.to_string()))
    }
}

/// Outcome of one directory pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub chunks_added: usize,
}

/// Ingests every `.pdf` file in `dir` whose name is not yet present in the
/// store's metadata.
///
/// Extraction and embedding failures skip the affected file and continue
/// with the rest; only store write failures abort the pass. Files are
/// visited in name order so repeated runs behave identically.
pub async fn ingest_directory(
    store: &JsonVectorStore,
    pipeline: &IngestionPipeline,
    extractor: &dyn TextExtractor,
    dir: &Path,
) -> Result<DirectoryReport, RagError> {
    let known = store.file_names().await;
    let mut report = DirectoryReport::default();

    let mut candidates = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }
        candidates.push((path, name));
    }
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    for (path, name) in candidates {
        if known.contains(&name) {
            debug!(file = %name, "already ingested, skipping");
            report.files_skipped += 1;
            continue;
        }

        let text = match extractor.extract(&path).await {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %name, %err, "extraction failed, skipping file");
                report.files_skipped += 1;
                continue;
            }
        };

        match pipeline.ingest_file_text(&name, &text).await {
            Ok(records) if records.is_empty() => {
                warn!(file = %name, "no embeddable chunks produced, skipping file");
                report.files_skipped += 1;
            }
            Ok(records) => {
                let added = records.len();
                store.add(records).await?;
                report.files_processed += 1;
                report.chunks_added += added;
                info!(file = %name, chunks = added, "file ingested");
            }
            Err(err) => {
                warn!(file = %name, %err, "ingestion failed, skipping file");
                report.files_skipped += 1;
            }
        }
    }

    info!(
        processed = report.files_processed,
        skipped = report.files_skipped,
        chunks = report.chunks_added,
        "directory ingestion complete"
    );
    Ok(report)
}
