//! Chunk-and-embed pipeline.
//!
//! The pipeline owns no storage: it produces `Vec<Record>` and leaves
//! persistence to the caller. Embedding calls run in bounded concurrent
//! windows to respect upstream rate limits; results are re-associated with
//! their originating chunk so output order always follows chunk order, even
//! when calls inside a window complete out of order.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::chunking::split_into_chunks;
use crate::config::ProcessingConfig;
use crate::crawler::CrawledPage;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{Record, RecordMetadata};
use crate::types::RagError;

/// Number of embedding calls in flight at once.
pub const DEFAULT_EMBED_WINDOW: usize = 5;

/// Chunks per approximate page for paginated sources.
const CHUNKS_PER_PAGE: usize = 3;

/// A chunk with its metadata, before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChunk {
    pub text: String,
    pub metadata: RecordMetadata,
}

pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    processing: ProcessingConfig,
    embed_window: usize,
}

impl IngestionPipeline {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, processing: ProcessingConfig) -> Self {
        Self {
            embedder,
            processing,
            embed_window: DEFAULT_EMBED_WINDOW,
        }
    }

    /// Overrides the embedding concurrency window (minimum 1).
    #[must_use]
    pub fn with_embed_window(mut self, window: usize) -> Self {
        self.embed_window = window.max(1);
        self
    }

    /// Splits one crawled page into metadata-carrying chunks.
    ///
    /// Pages and chunks below the configured minimum length are dropped;
    /// chunk indices count only the surviving chunks, matching what gets
    /// persisted.
    pub fn page_to_chunks(&self, page: &CrawledPage) -> Vec<SourceChunk> {
        if page.content.trim().chars().count() < self.processing.min_chunk_length {
            return Vec::new();
        }
        split_into_chunks(
            &page.content,
            self.processing.max_chunk_length,
            self.processing.chunk_overlap,
        )
        .into_iter()
        .filter(|chunk| chunk.chars().count() >= self.processing.min_chunk_length)
        .enumerate()
        .map(|(index, text)| SourceChunk {
            text,
            metadata: RecordMetadata::website(
                page.url.as_str(),
                page.title.clone(),
                index,
                page.last_updated,
            ),
        })
        .collect()
    }

    pub fn pages_to_chunks(&self, pages: &[CrawledPage]) -> Vec<SourceChunk> {
        pages
            .iter()
            .flat_map(|page| self.page_to_chunks(page))
            .collect()
    }

    /// Splits extracted file text into chunks with approximate page numbers.
    ///
    /// Fails with [`RagError::Extraction`] when the extractor recovered no
    /// usable text.
    pub fn file_text_to_chunks(
        &self,
        file_name: &str,
        text: &str,
    ) -> Result<Vec<SourceChunk>, RagError> {
        if text.trim().is_empty() {
            return Err(RagError::Extraction(format!(
                "no text content found in {file_name}"
            )));
        }
        Ok(split_into_chunks(
            text,
            self.processing.max_chunk_length,
            self.processing.chunk_overlap,
        )
        .into_iter()
        .enumerate()
        .map(|(index, text)| SourceChunk {
            text,
            metadata: RecordMetadata::pdf(
                file_name,
                (index / CHUNKS_PER_PAGE) as u32 + 1,
                index,
            ),
        })
        .collect())
    }

    /// Embeds chunks in bounded concurrent windows.
    ///
    /// A failed embedding call drops its chunk (logged, not retried), so
    /// partial upstream failures degrade coverage instead of aborting the
    /// run. Surviving records keep chunk order.
    pub async fn embed_chunks(&self, chunks: Vec<SourceChunk>) -> Vec<Record> {
        let total = chunks.len();
        let mut records = Vec::with_capacity(total);
        let mut pending = chunks.into_iter();
        loop {
            let window: Vec<SourceChunk> = pending.by_ref().take(self.embed_window).collect();
            if window.is_empty() {
                break;
            }
            let embeddings =
                join_all(window.iter().map(|chunk| self.embedder.embed(&chunk.text))).await;
            for (chunk, embedded) in window.into_iter().zip(embeddings) {
                match embedded {
                    Ok(embedding) => records.push(Record {
                        text: chunk.text,
                        embedding,
                        metadata: chunk.metadata,
                    }),
                    Err(err) => warn!(
                        chunk_index = chunk.metadata.chunk_index,
                        %err,
                        "embedding failed, dropping chunk"
                    ),
                }
            }
        }
        debug!(embedded = records.len(), total, "chunk embedding complete");
        records
    }

    pub async fn ingest_page(&self, page: &CrawledPage) -> Vec<Record> {
        self.embed_chunks(self.page_to_chunks(page)).await
    }

    pub async fn ingest_pages(&self, pages: &[CrawledPage]) -> Vec<Record> {
        self.embed_chunks(self.pages_to_chunks(pages)).await
    }

    pub async fn ingest_file_text(
        &self,
        file_name: &str,
        text: &str,
    ) -> Result<Vec<Record>, RagError> {
        let chunks = self.file_text_to_chunks(file_name, text)?;
        Ok(self.embed_chunks(chunks).await)
    }
}
