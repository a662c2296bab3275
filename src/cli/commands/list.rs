//! List command implementation.

use super::build_index;
use crate::chunking::format_timestamp;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let index = build_index(&settings)?;

    match index.list_sources(&settings.index.namespace).await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No sources indexed yet. Use 'svar index <source>' to add content.");
            } else {
                Output::header(&format!("Indexed Sources ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(
                        &source.source_id,
                        source.record_count,
                        &format_timestamp(source.max_end_offset),
                    );
                }

                let total_records: u32 = sources.iter().map(|s| s.record_count).sum();
                println!();
                Output::kv("Total sources", &sources.len().to_string());
                Output::kv("Total chunks", &total_records.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
