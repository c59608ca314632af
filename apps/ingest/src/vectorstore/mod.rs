//! Filtered cosine-similarity store over a single JSON index file.
//!
//! `save` is a whole-collection read-modify-write and `query` is a linear
//! scan. Both are deliberate: the run-scoped corpus tops out at tens of
//! thousands of chunks, and one ingestion process owns the file at a time.
//! Storage failures here are fatal; there is no safe fallback for losing
//! the collection.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;

const INDEX_FILE: &str = "index.json";

/// One persisted vector plus the chunk metadata used for filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// A query hit.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    pub score: f32,
}

/// Exact-equality metadata constraints. Every present key must match; a
/// record missing the key fails the filter.
pub type QueryFilter = BTreeMap<String, String>;

pub struct VectorStore {
    index_path: PathBuf,
}

impl VectorStore {
    pub fn new(vector_dir: &Path) -> Self {
        Self {
            index_path: vector_dir.join(INDEX_FILE),
        }
    }

    /// Appends records to the persisted collection. Does not deduplicate;
    /// callers must avoid re-saving a chunk within a run.
    pub fn save(&self, records: &[VectorRecord]) -> Result<(), AppError> {
        let mut collection = self.read_all()?;
        collection.extend_from_slice(records);

        if let Some(parent) = self.index_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.index_path, serde_json::to_string_pretty(&collection)?)?;
        info!(
            "Stored {} vectors ({} total in index)",
            records.len(),
            collection.len()
        );
        Ok(())
    }

    /// Top-k cosine matches, filtered first, sorted by descending score.
    /// The sort is stable, so equal scores keep insertion order. An empty
    /// or missing index returns an empty result, not an error.
    pub fn query(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredRecord>, AppError> {
        let mut scored: Vec<ScoredRecord> = self
            .read_all()?
            .into_iter()
            .filter(|record| filter.map_or(true, |f| matches_filter(record, f)))
            .map(|record| {
                let score = cosine_similarity(query, &record.vector);
                ScoredRecord { record, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    fn read_all(&self) -> Result<Vec<VectorRecord>, AppError> {
        if !self.index_path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.index_path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn matches_filter(record: &VectorRecord, filter: &QueryFilter) -> bool {
    filter.iter().all(|(key, expected)| {
        match record.metadata.get(key) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        }
    })
}

/// Cosine similarity over the shared prefix of the two vectors. A zero
/// norm on either side scores 0.0 instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len().min(b.len()) {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chunk_id: &str, vector: Vec<f32>, country: Option<&str>) -> VectorRecord {
        let mut metadata = Map::new();
        metadata.insert("chunk_id".into(), Value::String(chunk_id.into()));
        if let Some(country) = country {
            metadata.insert("location_country".into(), Value::String(country.into()));
        }
        VectorRecord {
            chunk_id: chunk_id.to_string(),
            vector,
            metadata,
        }
    }

    #[test]
    fn test_cosine_of_self_is_one() {
        let v = vec![0.3, -0.7, 0.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let other = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &other), 0.0);
        assert_eq!(cosine_similarity(&other, &zero), 0.0);
    }

    #[test]
    fn test_cosine_uses_shared_prefix_on_length_mismatch() {
        let short = vec![1.0, 0.0];
        let long = vec![1.0, 0.0, 5.0, 5.0];
        assert!((cosine_similarity(&short, &long) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_query_on_missing_index_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let hits = store.query(&[1.0, 0.0], 5, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_save_and_query_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        store
            .save(&[
                record("a", vec![0.0, 1.0, 0.0], None),
                record("b", vec![1.0, 0.0, 0.0], None),
                record("c", vec![0.5, 0.5, 0.0], None),
            ])
            .unwrap();

        let hits = store.query(&[1.0, 0.0, 0.0], 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.chunk_id, "b");
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[1].record.chunk_id, "c");
    }

    #[test]
    fn test_top_k_caps_result_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("c{i}"), vec![1.0, i as f32], None))
            .collect();
        store.save(&records).unwrap();

        let hits = store.query(&[1.0, 1.0], 3, None).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_filter_excludes_mismatched_and_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        store
            .save(&[
                record("in", vec![1.0, 0.0], Some("India")),
                record("us", vec![1.0, 0.0], Some("United States")),
                record("none", vec![1.0, 0.0], None),
            ])
            .unwrap();

        let mut filter = QueryFilter::new();
        filter.insert("location_country".into(), "India".into());
        let hits = store.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.chunk_id, "in");
    }

    #[test]
    fn test_save_appends_without_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let r = record("dup", vec![1.0], None);
        store.save(std::slice::from_ref(&r)).unwrap();
        store.save(std::slice::from_ref(&r)).unwrap();

        let hits = store.query(&[1.0], 10, None).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        store
            .save(&[
                record("first", vec![2.0, 0.0], None),
                record("second", vec![4.0, 0.0], None),
            ])
            .unwrap();

        let hits = store.query(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(hits[0].record.chunk_id, "first");
        assert_eq!(hits[1].record.chunk_id, "second");
    }
}
