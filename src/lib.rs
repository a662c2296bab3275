//! Svar - Retrieval-Augmented Answering
//!
//! A pipeline for answering questions about transcripts and documents.
//! The name "Svar" comes from the Norwegian word for "answer."
//!
//! # Overview
//!
//! Svar lets you:
//! - Split transcripts and documents into bounded, offset-aware chunks
//! - Embed chunks into a vector index, with a deterministic fallback when
//!   no embedding provider is reachable
//! - Retrieve the most relevant chunks for a question
//! - Stream an answer grounded in the retrieved context, with timestamp
//!   citations
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `source` - Text source abstraction (transcripts, documents)
//! - `chunking` - Word-budget content chunking
//! - `embedding` - Embedding generation and fallback
//! - `vector_index` - Namespaced vector index abstraction
//! - `retrieval` - Context retrieval
//! - `answer` - Prompt composition and streaming generation
//! - `reindex` - Pipeline coordination over sources
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svar::embedding::Embedder;
//! use svar::reindex::ReindexOrchestrator;
//! use svar::source::FsTextSource;
//! use svar::vector_index::MemoryVectorIndex;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = ReindexOrchestrator::new(
//!         Arc::new(FsTextSource::new("./sources")),
//!         Arc::new(Embedder::offline(1024)),
//!         Arc::new(MemoryVectorIndex::new()),
//!         "transcripts",
//!     );
//!
//!     let outcome = orchestrator.reindex("lesson-1").await;
//!     println!("{:?}", outcome.status);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod reindex;
pub mod retrieval;
pub mod source;
pub mod vector_index;

pub use error::{Result, SvarError};
