//! Vector index abstraction for Svar.
//!
//! Provides a trait-based interface over namespaced vector stores. Records
//! live in a namespace (one per content category); queries are restricted
//! by an exact-equality metadata filter within it.

mod memory;
mod sqlite;

pub use memory::MemoryVectorIndex;
pub use sqlite::SqliteVectorIndex;

use crate::embedding::EmbeddedChunk;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Source this record belongs to.
    pub source_id: String,
    /// Text content of the underlying chunk.
    pub text: String,
    /// Start offset (words or seconds, per the source).
    pub start_offset: f64,
    /// End offset.
    pub end_offset: f64,
}

impl RecordMetadata {
    /// Value of a filterable metadata field, if the key names one.
    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "source_id" => Some(&self.source_id),
            "text" => Some(&self.text),
            _ => None,
        }
    }
}

/// A record as stored in the index.
///
/// `id` is unique within a namespace; re-upserting the same id replaces the
/// prior vector and metadata.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    /// Record id.
    pub id: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Positional and source metadata.
    pub metadata: RecordMetadata,
}

impl From<EmbeddedChunk> for IndexRecord {
    fn from(chunk: EmbeddedChunk) -> Self {
        Self {
            id: chunk.id,
            vector: chunk.vector,
            metadata: RecordMetadata {
                source_id: chunk.source_id,
                text: chunk.text,
                start_offset: chunk.start_offset,
                end_offset: chunk.end_offset,
            },
        }
    }
}

/// A single query match with its similarity score.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// Similarity score (higher is better).
    pub score: f32,
    /// The matched record's metadata.
    pub metadata: RecordMetadata,
}

/// Per-call query parameters.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of matches to return.
    pub top_k: usize,
    /// Exact-equality metadata filter; every key must match.
    pub filter: HashMap<String, String>,
}

impl QueryOptions {
    /// Query options with no filter.
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            filter: HashMap::new(),
        }
    }

    /// Restrict matches to one source.
    pub fn with_source(mut self, source_id: &str) -> Self {
        self.filter
            .insert("source_id".to_string(), source_id.to_string());
        self
    }
}

/// Summary of one source's records in a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source id.
    pub source_id: String,
    /// Number of records.
    pub record_count: u32,
    /// Largest end offset across the source's chunks.
    pub max_end_offset: f64,
    /// When the source was last indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records in a namespace. Atomic per call.
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()>;

    /// Top-K similarity query within a namespace.
    ///
    /// An empty result is not an error. An unknown filter key is.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<QueryMatch>>;

    /// Delete all records for a source. Returns the number removed.
    async fn delete_by_source(&self, namespace: &str, source_id: &str) -> Result<usize>;

    /// List sources present in a namespace.
    async fn list_sources(&self, namespace: &str) -> Result<Vec<IndexedSource>>;

    /// Total record count in a namespace.
    async fn record_count(&self, namespace: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Check a record against a filter.
///
/// Every filter key must name a known metadata field and match exactly; an
/// unknown key is an input error rather than a silent non-match.
pub(crate) fn matches_filter(
    metadata: &RecordMetadata,
    filter: &HashMap<String, String>,
) -> Result<bool> {
    for (key, expected) in filter {
        let actual = metadata.field(key).ok_or_else(|| {
            SvarError::InvalidInput(format!("Unknown filter key: {}", key))
        })?;
        if actual != expected {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Order scored records: descending score, then ascending start offset,
/// then id, so equal-score matches come out in a stable, documented order.
pub(crate) fn rank_scored(scored: &mut [(f32, IndexRecord)]) {
    scored.sort_by(|(score_a, rec_a), (score_b, rec_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                rec_a
                    .metadata
                    .start_offset
                    .partial_cmp(&rec_b.metadata.start_offset)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| rec_a.id.cmp(&rec_b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, source_id: &str, start: f64, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            vector,
            metadata: RecordMetadata {
                source_id: source_id.to_string(),
                text: format!("text for {}", id),
                start_offset: start,
                end_offset: start + 1.0,
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_filter_matching() {
        let metadata = RecordMetadata {
            source_id: "vid1".to_string(),
            text: "hello".to_string(),
            start_offset: 0.0,
            end_offset: 1.0,
        };

        let mut filter = HashMap::new();
        filter.insert("source_id".to_string(), "vid1".to_string());
        assert!(matches_filter(&metadata, &filter).unwrap());

        filter.insert("source_id".to_string(), "vid2".to_string());
        assert!(!matches_filter(&metadata, &filter).unwrap());

        let mut bad = HashMap::new();
        bad.insert("no_such_field".to_string(), "x".to_string());
        assert!(matches_filter(&metadata, &bad).is_err());
    }

    #[test]
    fn test_equal_scores_rank_by_offset_then_id() {
        let mut scored = vec![
            (0.5, record("b", "s", 20.0, vec![1.0])),
            (0.5, record("a", "s", 10.0, vec![1.0])),
            (0.9, record("c", "s", 30.0, vec![1.0])),
            (0.5, record("a2", "s", 10.0, vec![1.0])),
        ];

        rank_scored(&mut scored);

        let ids: Vec<&str> = scored.iter().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "a2", "b"]);
    }

    #[test]
    fn test_embedded_chunk_conversion() {
        let chunk = EmbeddedChunk {
            id: "vid-0".to_string(),
            source_id: "vid".to_string(),
            text: "content".to_string(),
            start_offset: 5.0,
            end_offset: 9.0,
            vector: vec![0.1, 0.2],
        };

        let record: IndexRecord = chunk.into();
        assert_eq!(record.id, "vid-0");
        assert_eq!(record.metadata.source_id, "vid");
        assert_eq!(record.metadata.start_offset, 5.0);
    }
}
