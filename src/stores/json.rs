//! In-memory vector store persisted to a single JSON file.
//!
//! The store holds every record in memory and rewrites the whole file after
//! each mutation (append-then-flush). Corpora here are bounded by crawl
//! budgets and a handful of documents, so a linear flush stays cheap and the
//! file stays small enough to diff by hand.
//!
//! Loading is lazy and deduplicated: the first operation after construction
//! reads the file, and concurrent callers arriving mid-load all await the
//! same in-flight read. A missing or corrupt file degrades to an empty store
//! with a logged error rather than failing construction.
//!
//! Every mutating operation holds the store's async mutex across its whole
//! read-modify-write-persist sequence, so a `search` can never observe a
//! half-applied mutation.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info};

use super::{Record, SourceKind, SourceStats};
use crate::types::RagError;

/// Counts returned by [`JsonVectorStore::replace_matching`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub removed: usize,
    pub added: usize,
}

pub struct JsonVectorStore {
    path: PathBuf,
    state: OnceCell<Mutex<Vec<Record>>>,
}

impl JsonVectorStore {
    /// Creates a store backed by the given file. Nothing is read until the
    /// first operation touches the store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn state(&self) -> &Mutex<Vec<Record>> {
        self.state
            .get_or_init(|| async { Mutex::new(self.load().await) })
            .await
    }

    async fn load(&self) -> Vec<Record> {
        match fs::read_to_string(&self.path).await {
            Ok(data) => match serde_json::from_str::<Vec<Record>>(&data) {
                Ok(records) => {
                    info!(
                        count = records.len(),
                        path = %self.path.display(),
                        "loaded vector store"
                    );
                    records
                }
                Err(err) => {
                    error!(
                        path = %self.path.display(),
                        %err,
                        "store file is not valid JSON, starting empty"
                    );
                    Vec::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no existing store file");
                Vec::new()
            }
            Err(err) => {
                error!(
                    path = %self.path.display(),
                    %err,
                    "failed to read store file, starting empty"
                );
                Vec::new()
            }
        }
    }

    async fn persist(&self, records: &[Record]) -> Result<(), RagError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, serialized)
            .await
            .map_err(|err| RagError::Store(format!("write {}: {err}", self.path.display())))
    }

    /// Appends records and flushes the full set to disk before returning.
    ///
    /// An empty batch is a successful no-op that still leaves the persisted
    /// file valid. Records whose embedding length disagrees with the store's
    /// established dimensionality are rejected wholesale.
    pub async fn add(&self, new_records: Vec<Record>) -> Result<(), RagError> {
        let mut records = self.state().await.lock().await;
        ensure_uniform_dimension(&records, &new_records)?;
        let added = new_records.len();
        records.extend(new_records);
        self.persist(&records).await?;
        debug!(added, total = records.len(), "records appended");
        Ok(())
    }

    /// Top-K cosine similarity search.
    ///
    /// Keeps an insertion-sorted buffer of at most `top_k` candidates while
    /// scanning the corpus once: a new candidate displaces the current
    /// minimum only when strictly greater, so earlier records win exact
    /// ties. Returns fewer than `top_k` hits when the store is smaller, and
    /// nothing for an empty store.
    ///
    /// A query whose length differs from the store's dimensionality is
    /// rejected whole with [`RagError::DimensionMismatch`] before any
    /// comparison — `add` keeps the stored set uniform, so a mismatch can
    /// only be a caller error.
    pub async fn search(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<(Record, f32)>, RagError> {
        let records = self.state().await.lock().await;
        if records.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let expected = records[0].embedding.len();
        if query.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut top: Vec<(usize, f32)> = Vec::with_capacity(top_k);
        for (index, record) in records.iter().enumerate() {
            let similarity = cosine_similarity(query, &record.embedding);
            if top.len() < top_k {
                let position = top
                    .iter()
                    .position(|&(_, existing)| similarity > existing)
                    .unwrap_or(top.len());
                top.insert(position, (index, similarity));
            } else if similarity > top[top.len() - 1].1 {
                top.pop();
                let position = top
                    .iter()
                    .position(|&(_, existing)| similarity > existing)
                    .unwrap_or(top.len());
                top.insert(position, (index, similarity));
            }
        }

        Ok(top
            .into_iter()
            .map(|(index, similarity)| (records[index].clone(), similarity))
            .collect())
    }

    /// Empties the store and persists the empty state.
    pub async fn clear(&self) -> Result<(), RagError> {
        let mut records = self.state().await.lock().await;
        records.clear();
        self.persist(&records).await?;
        info!("vector store cleared");
        Ok(())
    }

    /// Removes every record of the given source kind, returning how many
    /// were dropped. The file is rewritten only when something changed.
    pub async fn remove_by_source(&self, source: SourceKind) -> Result<usize, RagError> {
        let mut records = self.state().await.lock().await;
        let before = records.len();
        records.retain(|record| record.metadata.source != source);
        let removed = before - records.len();
        if removed > 0 {
            self.persist(&records).await?;
            info!(removed, %source, "records removed by source");
        }
        Ok(removed)
    }

    /// Removes all records matching `predicate` and inserts `new_records`,
    /// as one in-memory step followed by a single flush.
    ///
    /// Dimensionality is checked against the records that survive the
    /// removal, so replacing an entire corpus may legitimately change the
    /// store's dimensionality (e.g. after switching embedding providers).
    pub async fn replace_matching(
        &self,
        predicate: impl Fn(&Record) -> bool,
        new_records: Vec<Record>,
    ) -> Result<ReplaceOutcome, RagError> {
        let mut records = self.state().await.lock().await;
        let before = records.len();
        let mut retained: Vec<Record> =
            records.iter().filter(|r| !predicate(r)).cloned().collect();
        let removed = before - retained.len();
        ensure_uniform_dimension(&retained, &new_records)?;
        let added = new_records.len();
        retained.extend(new_records);
        *records = retained;
        self.persist(&records).await?;
        info!(removed, added, "records replaced");
        Ok(ReplaceOutcome { removed, added })
    }

    pub async fn count(&self) -> usize {
        self.state().await.lock().await.len()
    }

    /// Snapshot of all records of one source kind, in insertion order.
    pub async fn records_by_source(&self, source: SourceKind) -> Vec<Record> {
        self.state()
            .await
            .lock()
            .await
            .iter()
            .filter(|record| record.metadata.source == source)
            .cloned()
            .collect()
    }

    /// Distinct file names present in stored metadata. Drives the
    /// once-per-file directory ingestion check.
    pub async fn file_names(&self) -> BTreeSet<String> {
        self.state()
            .await
            .lock()
            .await
            .iter()
            .filter_map(|record| record.metadata.file_name.clone())
            .collect()
    }

    /// Per-source record counts plus the distinct URLs and files behind them.
    pub async fn source_stats(&self) -> BTreeMap<SourceKind, SourceStats> {
        let records = self.state().await.lock().await;
        let mut stats: BTreeMap<SourceKind, SourceStats> = BTreeMap::new();
        for record in records.iter() {
            let entry = stats.entry(record.metadata.source).or_default();
            entry.records += 1;
            if let Some(url) = &record.metadata.url {
                entry.urls.insert(url.clone());
            }
            if let Some(file) = &record.metadata.file_name {
                entry.files.insert(file.clone());
            }
        }
        stats
    }
}

fn ensure_uniform_dimension(existing: &[Record], incoming: &[Record]) -> Result<(), RagError> {
    let expected = existing
        .first()
        .or(incoming.first())
        .map(|record| record.embedding.len());
    let Some(expected) = expected else {
        return Ok(());
    };
    for record in incoming {
        if record.embedding.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: record.embedding.len(),
            });
        }
    }
    Ok(())
}

/// Cosine similarity `dot(a, b) / (‖a‖·‖b‖)`, defined as 0 when either norm
/// is 0 (never NaN). Callers must pass equal-length vectors; the store
/// enforces that at its API boundary.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::RecordMetadata;

    fn record(text: &str, embedding: Vec<f32>) -> Record {
        Record {
            text: text.to_string(),
            embedding,
            metadata: RecordMetadata::pdf("test.pdf", 1, 0),
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -1.2, 4.5];
        assert_eq!(cosine_similarity(&v, &v), 1.0);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let v = vec![1.0, 2.0, -3.0];
        let negated: Vec<f32> = v.iter().map(|x| -x).collect();
        assert_eq!(cosine_similarity(&v, &negated), -1.0);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let v = vec![1.0, 2.0];
        let zero = vec![0.0, 0.0];
        let similarity = cosine_similarity(&v, &zero);
        assert_eq!(similarity, 0.0);
        assert!(!similarity.is_nan());
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[tokio::test]
    async fn search_matches_full_sort_with_earlier_wins_ties() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vectors.json"));
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.6, 0.8],
            vec![1.0, 0.0], // exact tie with the first record
            vec![-1.0, 0.0],
        ];
        let records: Vec<Record> = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| record(&format!("r{i}"), e.clone()))
            .collect();
        store.add(records.clone()).await.unwrap();

        let query = vec![1.0, 0.0];
        let hits = store.search(&query, 3).await.unwrap();

        // Full-sort reference: stable sort keeps encounter order on ties.
        let mut reference: Vec<(usize, f32)> = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query, e)))
            .collect();
        reference.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let got: Vec<&str> = hits.iter().map(|(r, _)| r.text.as_str()).collect();
        assert_eq!(got, vec!["r0", "r3", "r2"]);
        for (hit, expected) in hits.iter().zip(reference.iter()) {
            assert!((hit.1 - expected.1).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn search_scenario_from_three_known_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vectors.json"));
        store
            .add(vec![
                record("first", vec![1.0, 0.0]),
                record("second", vec![0.0, 1.0]),
                record("third", vec![0.9, 0.1]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.text, "first");
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].0.text, "third");
        assert!((hits[1].1 - 0.9939).abs() < 1e-3);
    }

    #[tokio::test]
    async fn search_returns_fewer_hits_than_requested_on_small_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vectors.json"));
        assert!(store.search(&[1.0, 0.0], 5).await.unwrap().is_empty());

        store.add(vec![record("only", vec![0.5, 0.5])]).await.unwrap();
        let hits = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn query_dimension_mismatch_rejects_whole_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vectors.json"));
        store.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();

        let err = store.search(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn mixed_dimension_add_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vectors.json"));
        store.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();

        let err = store
            .add(vec![record("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
        assert_eq!(store.count().await, 1);
    }
}
