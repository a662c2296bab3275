//! Index command implementation.

use super::{build_embedder, build_index};
use crate::chunking::TextChunker;
use crate::cli::Output;
use crate::config::Settings;
use crate::reindex::{ReindexOrchestrator, ReindexStatus};
use crate::source::FsTextSource;
use anyhow::Result;
use std::sync::Arc;

/// Run the index command.
pub async fn run_index(sources: &[String], settings: Settings) -> Result<()> {
    let embedder = build_embedder(&settings);
    let index = build_index(&settings)?;
    let source_provider = Arc::new(FsTextSource::new(settings.sources_dir()));

    let orchestrator = ReindexOrchestrator::new(
        source_provider,
        embedder,
        index,
        &settings.index.namespace,
    )
    .with_chunker(TextChunker::new(settings.chunking.target_word_count))
    .with_max_concurrent(settings.reindex.max_concurrent);

    let spinner = Output::spinner(&format!("Indexing {} source(s)...", sources.len()));
    let outcomes = orchestrator.reindex_all(sources).await;
    spinner.finish_and_clear();

    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.status {
            ReindexStatus::Indexed { chunks } => {
                Output::success(&format!("{}: indexed {} chunks", outcome.source_id, chunks));
            }
            ReindexStatus::NotFound => {
                Output::warning(&format!("{}: not found", outcome.source_id));
                failures += 1;
            }
            ReindexStatus::Error { detail } => {
                Output::error(&format!("{}: {}", outcome.source_id, detail));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} source(s) failed", failures, outcomes.len());
    }

    Ok(())
}
