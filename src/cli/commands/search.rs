//! Search command implementation.

use super::{build_embedder, build_index};
use crate::chunking::format_timestamp;
use crate::cli::Output;
use crate::config::Settings;
use crate::retrieval::Retriever;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    source: Option<String>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    let embedder = build_embedder(&settings);
    let index = build_index(&settings)?;

    let retriever =
        Retriever::new(embedder, index, &settings.index.namespace).with_top_k(limit);

    let spinner = Output::spinner("Searching...");
    let results = retriever.search(query, source.as_deref()).await;
    spinner.finish_and_clear();

    match results {
        Ok(matches) => {
            if matches.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", matches.len()));

                for m in &matches {
                    Output::search_result(
                        &m.metadata.source_id,
                        &format_timestamp(m.metadata.start_offset),
                        m.score,
                        &m.metadata.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
