//! In-memory vector index implementation.
//!
//! Useful for testing and sources small enough to rebuild on startup.

use super::{
    cosine_similarity, matches_filter, rank_scored, IndexRecord, IndexedSource, QueryMatch,
    QueryOptions, VectorIndex,
};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

type Namespace = HashMap<String, (IndexRecord, DateTime<Utc>)>;

/// In-memory vector index.
pub struct MemoryVectorIndex {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl MemoryVectorIndex {
    /// Create a new in-memory vector index.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))?;

        let ns = namespaces.entry(namespace.to_string()).or_default();
        let now = Utc::now();
        for record in records {
            ns.insert(record.id.clone(), (record.clone(), now));
        }

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<QueryMatch>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))?;

        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, IndexRecord)> = Vec::new();
        for (record, _) in ns.values() {
            if !matches_filter(&record.metadata, &options.filter)? {
                continue;
            }
            scored.push((cosine_similarity(vector, &record.vector), record.clone()));
        }

        rank_scored(&mut scored);
        scored.truncate(options.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| QueryMatch {
                score,
                metadata: record.metadata,
            })
            .collect())
    }

    async fn delete_by_source(&self, namespace: &str, source_id: &str) -> Result<usize> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))?;

        let Some(ns) = namespaces.get_mut(namespace) else {
            return Ok(0);
        };

        let initial_len = ns.len();
        ns.retain(|_, (record, _)| record.metadata.source_id != source_id);
        Ok(initial_len - ns.len())
    }

    async fn list_sources(&self, namespace: &str) -> Result<Vec<IndexedSource>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))?;

        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut sources: HashMap<String, IndexedSource> = HashMap::new();
        for (record, indexed_at) in ns.values() {
            let entry = sources
                .entry(record.metadata.source_id.clone())
                .or_insert_with(|| IndexedSource {
                    source_id: record.metadata.source_id.clone(),
                    record_count: 0,
                    max_end_offset: 0.0,
                    indexed_at: *indexed_at,
                });

            entry.record_count += 1;
            if record.metadata.end_offset > entry.max_end_offset {
                entry.max_end_offset = record.metadata.end_offset;
            }
            if *indexed_at > entry.indexed_at {
                entry.indexed_at = *indexed_at;
            }
        }

        let mut listing: Vec<IndexedSource> = sources.into_values().collect();
        listing.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        Ok(listing)
    }

    async fn record_count(&self, namespace: &str) -> Result<usize> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))?;

        Ok(namespaces.get(namespace).map(|ns| ns.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::RecordMetadata;

    fn record(id: &str, source_id: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            vector,
            metadata: RecordMetadata {
                source_id: source_id.to_string(),
                text: format!("text of {}", id),
                start_offset: 0.0,
                end_offset: 10.0,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_then_query_ranks_exact_match_first() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(
                "content",
                &[
                    record("a", "vid1", vec![1.0, 0.0, 0.0]),
                    record("b", "vid1", vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let matches = index
            .query("content", &[1.0, 0.0, 0.0], &QueryOptions::top_k(10))
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].metadata.text, "text of a");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn test_filter_excluding_all_returns_empty() {
        let index = MemoryVectorIndex::new();
        index
            .upsert("content", &[record("a", "vid1", vec![1.0, 0.0])])
            .await
            .unwrap();

        let options = QueryOptions::top_k(5).with_source("other-video");
        let matches = index
            .query("content", &[1.0, 0.0], &options)
            .await
            .unwrap();

        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_replace() {
        let index = MemoryVectorIndex::new();
        index
            .upsert("content", &[record("a", "vid1", vec![1.0, 0.0])])
            .await
            .unwrap();

        let mut replacement = record("a", "vid1", vec![0.0, 1.0]);
        replacement.metadata.text = "replaced".to_string();
        index.upsert("content", &[replacement]).await.unwrap();

        assert_eq!(index.record_count("content").await.unwrap(), 1);

        let matches = index
            .query("content", &[0.0, 1.0], &QueryOptions::top_k(1))
            .await
            .unwrap();
        assert_eq!(matches[0].metadata.text, "replaced");
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let index = MemoryVectorIndex::new();
        index
            .upsert("alpha", &[record("a", "vid1", vec![1.0])])
            .await
            .unwrap();

        assert_eq!(index.record_count("beta").await.unwrap(), 0);
        let matches = index
            .query("beta", &[1.0], &QueryOptions::top_k(5))
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_source_and_listing() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(
                "content",
                &[
                    record("a-0", "a", vec![1.0]),
                    record("a-1", "a", vec![1.0]),
                    record("b-0", "b", vec![1.0]),
                ],
            )
            .await
            .unwrap();

        let sources = index.list_sources("content").await.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_id, "a");
        assert_eq!(sources[0].record_count, 2);

        let removed = index.delete_by_source("content", "a").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.record_count("content").await.unwrap(), 1);
    }
}
