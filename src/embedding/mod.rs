//! Embedding generation with a deterministic fallback.
//!
//! The primary path calls an embedding provider over HTTP. Whenever that
//! provider is unconfigured, disabled, or failing, a deterministic
//! pseudo-embedding takes its place, so embedding as a whole never fails.

mod fallback;
mod openai;

pub use fallback::{fit_dimensions, pseudo_embedding};
pub use openai::OpenAIEmbeddingProvider;

use crate::chunking::Chunk;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Failure modes of an embedding provider call.
///
/// Rate limiting is split out because it signals a degraded service rather
/// than a broken configuration; both end up on the fallback path but are
/// logged under different diagnostic codes.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no embedding credential configured")]
    Unconfigured,

    #[error("embedding provider rate limited (429)")]
    RateLimited,

    #[error("embedding provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding provider returned no data")]
    EmptyResponse,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text, returning the provider's native vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Model name, for diagnostics.
    fn model(&self) -> &str;
}

/// A chunk together with its embedding vector.
///
/// `vector.len()` always equals the embedder's configured dimension, and
/// `id` is derived from the source id and the chunk's ordinal within its
/// batch, so re-embedding a source overwrites its prior records.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Record id, `<source_id>-<ordinal>`.
    pub id: String,
    /// Source this chunk belongs to.
    pub source_id: String,
    /// Text content.
    pub text: String,
    /// Start offset (words or seconds, per the source).
    pub start_offset: f64,
    /// End offset.
    pub end_offset: f64,
    /// Embedding vector, exactly the configured dimension.
    pub vector: Vec<f32>,
}

/// Embedder with provider path and deterministic fallback.
pub struct Embedder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    dimensions: usize,
    disabled: bool,
    max_concurrent: usize,
}

impl Embedder {
    /// Create an embedder backed by a provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
        Self {
            provider: Some(provider),
            dimensions,
            disabled: false,
            max_concurrent: 4,
        }
    }

    /// Create an embedder with no provider; every call uses the fallback.
    pub fn offline(dimensions: usize) -> Self {
        Self {
            provider: None,
            dimensions,
            disabled: false,
            max_concurrent: 4,
        }
    }

    /// Force the fallback path even when a provider is configured.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the concurrency limit for batch embedding.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The fixed target dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a single text. Never fails.
    ///
    /// The provider's vector is padded or truncated to the target dimension
    /// even on success; any provider failure substitutes the deterministic
    /// pseudo-embedding.
    #[instrument(skip(self, text))]
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if self.disabled {
            debug!(code = "embed.disabled", "Embedding disabled, using fallback");
            return pseudo_embedding(text, self.dimensions);
        }

        let provider = match &self.provider {
            Some(p) => p,
            None => {
                debug!(code = "embed.unconfigured", "No embedding provider, using fallback");
                return pseudo_embedding(text, self.dimensions);
            }
        };

        match provider.embed(text).await {
            Ok(vector) => fit_dimensions(vector, self.dimensions),
            Err(ProviderError::RateLimited) => {
                warn!(code = "embed.rate_limited", "Provider rate limited, using fallback");
                pseudo_embedding(text, self.dimensions)
            }
            Err(e) => {
                warn!(code = "embed.provider_error", error = %e, "Provider failed, using fallback");
                pseudo_embedding(text, self.dimensions)
            }
        }
    }

    /// Embed a batch of chunks, preserving input order.
    ///
    /// Chunks are embedded concurrently up to the configured limit and
    /// reassembled in their original order, since offsets are positional
    /// metadata. Chunks that are empty after trimming are skipped with a
    /// warning; nothing in the batch is fatal.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Vec<EmbeddedChunk> {
        let mut results: Vec<(usize, EmbeddedChunk)> =
            stream::iter(chunks.iter().enumerate())
                .filter_map(|(ordinal, chunk)| async move {
                    if chunk.text.trim().is_empty() {
                        warn!("Skipping empty chunk {} of {}", ordinal, chunk.source_id);
                        return None;
                    }
                    Some((ordinal, chunk))
                })
                .map(|(ordinal, chunk)| async move {
                    let vector = self.embed(&chunk.text).await;
                    (
                        ordinal,
                        EmbeddedChunk {
                            id: format!("{}-{}", chunk.source_id, ordinal),
                            source_id: chunk.source_id.clone(),
                            text: chunk.text.clone(),
                            start_offset: chunk.start_offset,
                            end_offset: chunk.end_offset,
                            vector,
                        },
                    )
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        results.sort_by_key(|(ordinal, _)| *ordinal);

        debug!("Embedded {} chunks", results.len());
        results.into_iter().map(|(_, chunk)| chunk).collect()
    }
}
