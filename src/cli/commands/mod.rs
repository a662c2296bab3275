//! Command implementations.

mod ask;
mod config;
mod index;
mod list;
mod search;

pub use ask::run_ask;
pub use config::run_config;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;

use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbeddingProvider};
use crate::error::Result;
use crate::vector_index::{MemoryVectorIndex, SqliteVectorIndex, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the configured embedder.
///
/// Falls back to the offline embedder when no `OPENAI_API_KEY` is set; the
/// pipeline still works, on deterministic pseudo-embeddings.
pub(crate) fn build_embedder(settings: &Settings) -> Arc<Embedder> {
    let dimensions = settings.embedding.dimensions as usize;

    let embedder = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            match OpenAIEmbeddingProvider::new(
                &settings.embedding.base_url,
                key,
                &settings.embedding.model,
                Duration::from_secs(settings.embedding.timeout_seconds),
            ) {
                Ok(provider) => Embedder::new(Arc::new(provider), dimensions),
                Err(e) => {
                    debug!("Embedding provider unavailable: {}", e);
                    Embedder::offline(dimensions)
                }
            }
        }
        _ => Embedder::offline(dimensions),
    };

    Arc::new(
        embedder
            .with_disabled(settings.embedding.disabled)
            .with_max_concurrent(settings.embedding.max_concurrent),
    )
}

/// Build the configured vector index.
pub(crate) fn build_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    match settings.index.provider.as_str() {
        "memory" => Ok(Arc::new(MemoryVectorIndex::new())),
        _ => Ok(Arc::new(SqliteVectorIndex::new(&settings.sqlite_path())?)),
    }
}
