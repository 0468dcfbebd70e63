//! Incremental content synchronization.
//!
//! Keeps the website corpus fresh without re-embedding on every run: a
//! re-crawl is compared against the stored corpus by content fingerprint,
//! and only a detected change (or an explicit force) triggers embedding and
//! a full replace of that corpus. Stable content makes `sync` a strict
//! no-op, so it can run on a schedule without churning the store.

use std::collections::HashSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::crawler::{CrawledPage, Crawler};
use crate::ingestion::{IngestionPipeline, SourceChunk};
use crate::stores::{JsonVectorStore, Record, SourceKind};
use crate::types::RagError;

/// Deterministic hash of `(url, text)` for one chunk. Equality-only; two
/// corpora are compared as sets of fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    pub fn compute(url: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        Self(hasher.finalize().into())
    }
}

/// True when the fresh chunk set differs from the current records in either
/// direction: new content appeared, or old content disappeared.
pub fn detect_changes(current: &[Record], fresh: &[SourceChunk]) -> bool {
    let current_prints: HashSet<ContentFingerprint> = current
        .iter()
        .map(|record| {
            ContentFingerprint::compute(record.metadata.url.as_deref().unwrap_or(""), &record.text)
        })
        .collect();
    let fresh_prints: HashSet<ContentFingerprint> = fresh
        .iter()
        .map(|chunk| {
            ContentFingerprint::compute(chunk.metadata.url.as_deref().unwrap_or(""), &chunk.text)
        })
        .collect();

    let has_new = fresh_prints.iter().any(|fp| !current_prints.contains(fp));
    let has_removed = current_prints.iter().any(|fp| !fresh_prints.contains(fp));
    has_new || has_removed
}

/// Counts reported by one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub unchanged: bool,
    pub pages_crawled: usize,
}

/// Re-crawls the configured site and reconciles the website corpus.
pub struct ContentSynchronizer {
    store: Arc<JsonVectorStore>,
    pipeline: Arc<IngestionPipeline>,
    crawler: Crawler,
}

impl ContentSynchronizer {
    pub fn new(
        store: Arc<JsonVectorStore>,
        pipeline: Arc<IngestionPipeline>,
        crawler: Crawler,
    ) -> Self {
        Self {
            store,
            pipeline,
            crawler,
        }
    }

    /// Crawls and reconciles. `force_update` skips change detection and
    /// re-embeds unconditionally.
    pub async fn sync(&self, force_update: bool) -> Result<SyncReport, RagError> {
        let pages = self.crawler.crawl().await?;
        if pages.is_empty() {
            // An empty crawl is indistinguishable from an outage; keep the
            // stored corpus instead of wiping it.
            return Err(RagError::InvalidDocument(
                "crawl produced no pages".to_string(),
            ));
        }
        self.sync_pages(&pages, force_update).await
    }

    /// Reconciles the website corpus against an already-crawled page set.
    ///
    /// Full-replace on any change: every stored website record is swapped
    /// for the freshly embedded set in one store operation. Unrelated
    /// source kinds are never touched.
    pub async fn sync_pages(
        &self,
        pages: &[CrawledPage],
        force_update: bool,
    ) -> Result<SyncReport, RagError> {
        let fresh = self.pipeline.pages_to_chunks(pages);
        if fresh.is_empty() {
            return Err(RagError::InvalidDocument(
                "crawled pages produced no chunks".to_string(),
            ));
        }
        debug!(chunks = fresh.len(), pages = pages.len(), "computed fresh chunk set");

        let current = self.store.records_by_source(SourceKind::Website).await;
        if !force_update && !detect_changes(&current, &fresh) {
            info!("website content unchanged, skipping re-embedding");
            return Ok(SyncReport {
                added: 0,
                removed: 0,
                unchanged: true,
                pages_crawled: pages.len(),
            });
        }

        let records = self.pipeline.embed_chunks(fresh).await;
        if records.is_empty() {
            // Every embedding call failed; replacing the corpus now would
            // destroy it over a transient outage.
            return Err(RagError::Embedding(
                "all embedding calls failed, keeping existing corpus".to_string(),
            ));
        }

        let outcome = self
            .store
            .replace_matching(
                |record| record.metadata.source == SourceKind::Website,
                records,
            )
            .await?;

        info!(
            added = outcome.added,
            removed = outcome.removed,
            "website corpus replaced"
        );
        Ok(SyncReport {
            added: outcome.added,
            removed: outcome.removed,
            unchanged: false,
            pages_crawled: pages.len(),
        })
    }
}
