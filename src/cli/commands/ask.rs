//! Ask command implementation.

use super::{build_embedder, build_index};
use crate::answer::AnswerComposer;
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::retrieval::Retriever;
use anyhow::Result;
use futures::StreamExt;
use std::io::Write;
use std::time::Duration;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    source: &str,
    document: Option<String>,
    model: Option<String>,
    settings: Settings,
) -> Result<()> {
    let embedder = build_embedder(&settings);
    let index = build_index(&settings)?;

    let retriever = Retriever::new(embedder, index, &settings.index.namespace)
        .with_top_k(settings.retrieval.top_k);

    // A supplied document is small enough to use verbatim, skipping the
    // index entirely.
    let full_text = match &document {
        Some(path) => Some(tokio::fs::read_to_string(path).await?),
        None => None,
    };

    let spinner = Output::spinner("Retrieving context...");
    let context = retriever
        .retrieve(question, source, full_text.as_deref())
        .await;
    spinner.finish_and_clear();

    let model = model.unwrap_or_else(|| settings.answer.model.clone());
    let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

    let composer = AnswerComposer::new(&model, Duration::from_secs(settings.answer.timeout_seconds))
        .with_prompts(prompts)
        .with_max_history_turns(settings.answer.max_history_turns);

    let mut stream = composer.answer(question, &context, &[]).await?;

    let mut stdout = std::io::stdout();
    while let Some(token) = stream.next().await {
        match token {
            Ok(text) => {
                write!(stdout, "{}", text)?;
                stdout.flush()?;
            }
            Err(e) => {
                println!();
                Output::error(&format!("Generation failed: {}", e));
                return Err(e.into());
            }
        }
    }
    println!();

    Ok(())
}
