//! Ingestion: turning raw sources into embedded, store-ready records.
//!
//! Two capabilities live here:
//!
//! * [`pipeline`] — chunking plus windowed embedding of crawled pages and
//!   extracted file text.
//! * [`files`] — the text-extraction seam for file formats and the
//!   once-per-file directory ingestion that feeds a knowledge base from a
//!   PDF drop folder.

pub mod files;
pub mod pipeline;

pub use files::{DirectoryReport, PlainTextExtractor, TextExtractor, ingest_directory};
pub use pipeline::{DEFAULT_EMBED_WINDOW, IngestionPipeline, SourceChunk};
