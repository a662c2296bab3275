//! CLI module for Svar.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - Retrieval-Augmented Answering
///
/// Indexes transcripts and documents into a vector store and answers
/// questions about them with cited timestamps. The name "Svar" comes from
/// the Norwegian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed, and index one or more sources
    Index {
        /// Source ids to index (files under the sources directory)
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// Ask a question about an indexed source
    Ask {
        /// The question to ask
        question: String,

        /// Source id to answer from
        #[arg(short, long)]
        source: String,

        /// Use a document file verbatim as context instead of the index
        #[arg(short, long)]
        document: Option<String>,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search indexed content for relevant chunks
    Search {
        /// Search query
        query: String,

        /// Restrict results to one source
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List indexed sources
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
