//! Configuration management for Svar.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    AnswerSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexSettings,
    PromptSettings, ReindexSettings, RetrievalSettings, Settings, SourceSettings,
};
