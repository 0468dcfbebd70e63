//! Retrieval engine for grounded chat assistants.
//!
//! ```text
//! crawler::Crawler ──► CrawledPage ─┐
//!                                   ├─► chunking ──► ingestion::IngestionPipeline
//! files::TextExtractor ──► text ────┘                      │
//!                                                          ▼
//!                              embeddings::EmbeddingProvider (bounded windows)
//!                                                          │
//!                                         Vec<Record> ─────▼
//!                                   stores::JsonVectorStore (one JSON file)
//!                                                          ▲
//! sync::ContentSynchronizer ── fingerprint diff ───────────┘
//!
//! query text ──► EmbeddingProvider ──► JsonVectorStore::search ──► top-K hits
//! ```
//!
//! The language model and document parsers stay outside this crate: text
//! embedding goes through [`embeddings::EmbeddingProvider`], file-format
//! parsing through [`ingestion::TextExtractor`], and answer generation is
//! the caller's business entirely.

pub mod chunking;
pub mod config;
pub mod crawler;
pub mod embeddings;
pub mod ingestion;
pub mod retrieval;
pub mod stores;
pub mod sync;
pub mod types;

pub use config::WebsiteConfig;
pub use crawler::{CrawledPage, Crawler};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use ingestion::{IngestionPipeline, TextExtractor, ingest_directory};
pub use retrieval::{RetrievalOptions, Retriever};
pub use stores::{JsonVectorStore, Record, RecordMetadata, SourceKind};
pub use sync::{ContentSynchronizer, SyncReport};
pub use types::RagError;
