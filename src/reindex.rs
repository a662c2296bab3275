//! Reindex orchestrator.
//!
//! Drives fetch → chunk → embed → upsert for one or many sources. Each
//! source gets its own outcome record; one source's failure never aborts
//! the batch.

use crate::chunking::TextChunker;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::source::TextSource;
use crate::vector_index::{IndexRecord, VectorIndex};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of reindexing one source.
#[derive(Debug, Clone, PartialEq)]
pub enum ReindexStatus {
    /// The source was chunked, embedded, and upserted.
    Indexed { chunks: usize },
    /// The text source provider has no text for this id.
    NotFound,
    /// A pipeline stage failed for this source.
    Error { detail: String },
}

/// Per-source reindex result.
#[derive(Debug, Clone)]
pub struct ReindexOutcome {
    /// Source id.
    pub source_id: String,
    /// What happened.
    pub status: ReindexStatus,
}

/// Coordinates the indexing pipeline over text sources.
pub struct ReindexOrchestrator {
    source_provider: Arc<dyn TextSource>,
    chunker: TextChunker,
    embedder: Arc<Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    max_concurrent: usize,
}

impl ReindexOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        source_provider: Arc<dyn TextSource>,
        embedder: Arc<Embedder>,
        index: Arc<dyn VectorIndex>,
        namespace: &str,
    ) -> Self {
        Self {
            source_provider,
            chunker: TextChunker::default(),
            embedder,
            index,
            namespace: namespace.to_string(),
            max_concurrent: 4,
        }
    }

    /// Use a custom chunker.
    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Set the concurrency limit for batch reindexing.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Reindex one source, reporting rather than raising failures.
    #[instrument(skip(self))]
    pub async fn reindex(&self, source_id: &str) -> ReindexOutcome {
        let status = match self.run_pipeline(source_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Reindex of {} failed: {}", source_id, e);
                ReindexStatus::Error {
                    detail: e.to_string(),
                }
            }
        };

        ReindexOutcome {
            source_id: source_id.to_string(),
            status,
        }
    }

    async fn run_pipeline(&self, source_id: &str) -> Result<ReindexStatus> {
        let Some(source) = self.source_provider.fetch_text(source_id).await? else {
            info!("No text found for {}", source_id);
            return Ok(ReindexStatus::NotFound);
        };

        if source.is_empty() {
            warn!("Source {} is empty, nothing to index", source_id);
            return Ok(ReindexStatus::Indexed { chunks: 0 });
        }

        let chunks = self.chunker.chunk(source_id, &source);
        info!("Chunked {} into {} chunks", source_id, chunks.len());

        let embedded = self.embedder.embed_chunks(&chunks).await;

        // Stale records from a prior, longer version of the source would
        // survive an id-overwrite alone.
        self.index
            .delete_by_source(&self.namespace, source_id)
            .await?;

        let records: Vec<IndexRecord> = embedded.into_iter().map(IndexRecord::from).collect();
        self.index.upsert(&self.namespace, &records).await?;

        info!("Indexed {} records for {}", records.len(), source_id);
        Ok(ReindexStatus::Indexed {
            chunks: records.len(),
        })
    }

    /// Reindex many sources with bounded concurrency.
    ///
    /// Outcomes come back in input order, one per source, regardless of
    /// completion order or individual failures.
    #[instrument(skip(self, source_ids), fields(count = source_ids.len()))]
    pub async fn reindex_all(&self, source_ids: &[String]) -> Vec<ReindexOutcome> {
        let mut results: Vec<(usize, ReindexOutcome)> =
            stream::iter(source_ids.iter().enumerate())
                .map(|(idx, source_id)| async move { (idx, self.reindex(source_id).await) })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvarError;
    use crate::source::{SourceText, TimedSegment};
    use crate::vector_index::{MemoryVectorIndex, QueryOptions};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const DIMS: usize = 32;

    /// Source provider over a fixed map; ids in `failing` error out.
    struct FakeSource {
        texts: HashMap<String, SourceText>,
        failing: Vec<String>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                texts: HashMap::new(),
                failing: Vec::new(),
            }
        }

        fn with_plain(mut self, id: &str, text: &str) -> Self {
            self.texts
                .insert(id.to_string(), SourceText::Plain(text.to_string()));
            self
        }

        fn with_timed(mut self, id: &str, segments: Vec<TimedSegment>) -> Self {
            self.texts
                .insert(id.to_string(), SourceText::Timed(segments));
            self
        }

        fn with_failure(mut self, id: &str) -> Self {
            self.failing.push(id.to_string());
            self
        }
    }

    #[async_trait]
    impl TextSource for FakeSource {
        async fn fetch_text(&self, source_id: &str) -> Result<Option<SourceText>> {
            if self.failing.iter().any(|id| id == source_id) {
                return Err(SvarError::Source("backend unavailable".to_string()));
            }
            Ok(self.texts.get(source_id).cloned())
        }
    }

    fn orchestrator(
        source: FakeSource,
        index: Arc<MemoryVectorIndex>,
    ) -> ReindexOrchestrator {
        ReindexOrchestrator::new(
            Arc::new(source),
            Arc::new(Embedder::offline(DIMS)),
            index,
            "transcripts",
        )
        .with_chunker(TextChunker::new(5))
    }

    #[tokio::test]
    async fn test_missing_source_reported_not_found() {
        let index = Arc::new(MemoryVectorIndex::new());
        let orch = orchestrator(FakeSource::new(), index.clone());

        let outcome = orch.reindex("absent").await;

        assert_eq!(outcome.source_id, "absent");
        assert_eq!(outcome.status, ReindexStatus::NotFound);
        assert_eq!(index.record_count("transcripts").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_isolates_missing_source() {
        let index = Arc::new(MemoryVectorIndex::new());
        let source = FakeSource::new()
            .with_plain("a", "Cats are mammals. Dogs are mammals too. Birds are not mammals.");
        let orch = orchestrator(source, index.clone());

        let outcomes = orch
            .reindex_all(&["a".to_string(), "b".to_string()])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].source_id, "a");
        assert_eq!(outcomes[0].status, ReindexStatus::Indexed { chunks: 3 });
        assert_eq!(outcomes[1].source_id, "b");
        assert_eq!(outcomes[1].status, ReindexStatus::NotFound);

        // a's chunks really landed in the index
        let options = QueryOptions::top_k(10).with_source("a");
        let matches = index
            .query("transcripts", &[0.0; DIMS], &options)
            .await
            .unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_isolates_provider_failure() {
        let index = Arc::new(MemoryVectorIndex::new());
        let source = FakeSource::new()
            .with_plain("good", "One two three four five six.")
            .with_failure("bad");
        let orch = orchestrator(source, index.clone());

        let outcomes = orch
            .reindex_all(&["bad".to_string(), "good".to_string()])
            .await;

        assert_eq!(outcomes[0].source_id, "bad");
        assert!(matches!(outcomes[0].status, ReindexStatus::Error { .. }));
        assert!(matches!(
            outcomes[1].status,
            ReindexStatus::Indexed { chunks: _ }
        ));
    }

    #[tokio::test]
    async fn test_timed_source_records_carry_timestamps() {
        let index = Arc::new(MemoryVectorIndex::new());
        let source = FakeSource::new().with_timed(
            "vid",
            vec![
                TimedSegment::new(0.0, 30.0, "First part of the talk here".to_string()),
                TimedSegment::new(30.0, 60.0, "Second part of the talk".to_string()),
            ],
        );
        let orch = orchestrator(source, index.clone());

        let outcome = orch.reindex("vid").await;
        assert!(matches!(outcome.status, ReindexStatus::Indexed { .. }));

        let options = QueryOptions::top_k(10).with_source("vid");
        let matches = index
            .query("transcripts", &[0.0; DIMS], &options)
            .await
            .unwrap();
        assert!(!matches.is_empty());
        assert!(matches.iter().any(|m| m.metadata.start_offset == 0.0));
    }

    #[tokio::test]
    async fn test_reindex_replaces_stale_records() {
        let index = Arc::new(MemoryVectorIndex::new());

        let long = FakeSource::new().with_plain(
            "doc",
            "One two three four five. Six seven eight nine ten. Eleven twelve thirteen fourteen.",
        );
        let orch = orchestrator(long, index.clone());
        orch.reindex("doc").await;
        let before = index.record_count("transcripts").await.unwrap();
        assert_eq!(before, 3);

        let short = FakeSource::new().with_plain("doc", "One two three four five.");
        let orch = orchestrator(short, index.clone());
        orch.reindex("doc").await;

        assert_eq!(index.record_count("transcripts").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_source_indexes_nothing() {
        let index = Arc::new(MemoryVectorIndex::new());
        let source = FakeSource::new().with_plain("blank", "   \n ");
        let orch = orchestrator(source, index.clone());

        let outcome = orch.reindex("blank").await;

        assert_eq!(outcome.status, ReindexStatus::Indexed { chunks: 0 });
        assert_eq!(index.record_count("transcripts").await.unwrap(), 0);
    }
}
