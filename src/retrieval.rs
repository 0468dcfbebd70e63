//! Query-side boundary: embed the question, rank the corpus, keep the
//! relevant hits.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::stores::{JsonVectorStore, Record};
use crate::types::RagError;

pub const DEFAULT_TOP_K: usize = 5;
/// Hits at or below this similarity are treated as noise.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.05;
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub min_similarity: f32,
    pub embed_timeout: Duration,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }
}

/// Embeds a query and returns the most similar records above the noise
/// threshold, best first.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<JsonVectorStore>,
    options: RetrievalOptions,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<JsonVectorStore>) -> Self {
        Self {
            embedder,
            store,
            options: RetrievalOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    /// An embedding call that exceeds its time budget fails with
    /// [`RagError::Timeout`]; nothing is cached or retried, the caller
    /// decides whether to ask again.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<(Record, f32)>, RagError> {
        let embedding = timeout(self.options.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| RagError::Timeout {
                operation: "query embedding",
                seconds: self.options.embed_timeout.as_secs(),
            })??;

        let hits = self.store.search(&embedding, self.options.top_k).await?;
        let kept: Vec<(Record, f32)> = hits
            .into_iter()
            .filter(|(_, similarity)| *similarity > self.options.min_similarity)
            .collect();
        debug!(hits = kept.len(), "retrieval complete");
        Ok(kept)
    }
}
