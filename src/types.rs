//! Shared error type for the retrieval engine.

use thiserror::Error;

/// Errors surfaced by ingestion, storage, synchronization, and retrieval.
///
/// Ingestion-level failures (`Extraction`, `Embedding`) are recovered locally
/// by the pipeline: the offending source or chunk is logged and skipped so one
/// bad input never aborts a whole batch. Store-level failures
/// (`DimensionMismatch`, `Store`, `Io`) are fatal to the single operation but
/// not to the process.
#[derive(Debug, Error)]
pub enum RagError {
    /// No text could be recovered from a source document.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// The upstream embedding service failed for one request.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// An embedding's length disagrees with the store's established
    /// dimensionality. Similarity across mixed dimensions is meaningless, so
    /// the operation is rejected before any score is produced.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Reading or writing the persisted store failed.
    #[error("vector store error: {0}")]
    Store(String),

    /// Filesystem error outside the store file itself.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An external call exceeded its time budget. Surfaced to the caller as a
    /// retryable condition, never retried inline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// Network-level failure while crawling.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A page, selector, or URL that cannot be processed.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// JSON encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
