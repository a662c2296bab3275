//! Context retrieval for answer generation.
//!
//! Turns a question into a ranked textual context by querying the vector
//! index, or short-circuits to the verbatim document for sources small
//! enough to fit in a prompt.

use crate::chunking::format_timestamp;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_index::{QueryMatch, QueryOptions, VectorIndex};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Sentinel context returned when retrieval finds nothing or fails.
///
/// Deliberately phrased for the generation prompt: the answer proceeds on
/// general knowledge instead of blocking on the missing context.
pub const DEGRADED_CONTEXT: &str =
    "(No relevant source material was found for this question. \
     Answer from general knowledge and note that the source did not cover it.)";

/// Retrieves ranked context for a question, scoped to one source.
pub struct Retriever {
    embedder: Arc<Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<Embedder>, index: Arc<dyn VectorIndex>, namespace: &str) -> Self {
        Self {
            embedder,
            index,
            namespace: namespace.to_string(),
            top_k: 5,
        }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieve context for a question.
    ///
    /// When `full_text` is supplied the caller already holds the whole
    /// document and it is returned verbatim; no embedding or index round
    /// trip happens. Otherwise the question is embedded and the index
    /// queried, restricted to `source_id`. Failures and empty results
    /// degrade to [`DEGRADED_CONTEXT`] instead of propagating, so the
    /// answer pipeline always has something to work with.
    #[instrument(skip(self, query_text, full_text))]
    pub async fn retrieve(
        &self,
        query_text: &str,
        source_id: &str,
        full_text: Option<&str>,
    ) -> String {
        if let Some(text) = full_text {
            debug!("Using verbatim full text for {}", source_id);
            return text.to_string();
        }

        let matches = match self.search(query_text, Some(source_id)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Retrieval failed for {}: {}, degrading context", source_id, e);
                return DEGRADED_CONTEXT.to_string();
            }
        };

        if matches.is_empty() {
            debug!("No matches for {} in {}", source_id, self.namespace);
            return DEGRADED_CONTEXT.to_string();
        }

        format_context(&matches)
    }

    /// Query the index for raw matches, optionally scoped to one source.
    pub async fn search(
        &self,
        query_text: &str,
        source_id: Option<&str>,
    ) -> Result<Vec<QueryMatch>> {
        let query_vector = self.embedder.embed(query_text).await;

        let mut options = QueryOptions::top_k(self.top_k);
        if let Some(source_id) = source_id {
            options = options.with_source(source_id);
        }

        self.index
            .query(&self.namespace, &query_vector, &options)
            .await
    }
}

/// Format matches as labeled context lines, best match first.
///
/// Each line carries the chunk's start offset in MM:SS form. For timed
/// sources that is a real timestamp; for plain documents it is a
/// positional marker over word counts.
pub fn format_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            format!(
                "[{}] {}",
                format_timestamp(m.metadata.start_offset),
                m.metadata.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
