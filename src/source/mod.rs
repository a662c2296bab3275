//! Text source abstraction.
//!
//! A text source hands the pipeline the raw material for one source id:
//! either a plain document or a transcript with per-segment timing. Where
//! the text comes from (ASR, OCR, a CMS export) is the provider's concern;
//! the pipeline treats it as opaque.

mod fs;

pub use fs::FsTextSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A timed segment of a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Text content of this segment.
    pub text: String,
}

impl TimedSegment {
    /// Create a new timed segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// Raw text for one source.
///
/// Plain sources carry word-count offsets through the pipeline; timed
/// sources carry second offsets taken from their segments.
#[derive(Debug, Clone)]
pub enum SourceText {
    /// A plain document with no timing information.
    Plain(String),
    /// A transcript with per-segment timestamps.
    Timed(Vec<TimedSegment>),
}

impl SourceText {
    /// Full text content, segments joined with spaces.
    pub fn full_text(&self) -> String {
        match self {
            SourceText::Plain(text) => text.clone(),
            SourceText::Timed(segments) => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Whether the source contains no text after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            SourceText::Plain(text) => text.trim().is_empty(),
            SourceText::Timed(segments) => segments.iter().all(|s| s.text.trim().is_empty()),
        }
    }
}

/// Trait for text source providers.
///
/// `Ok(None)` means the source does not exist, which is distinct from a
/// source that exists but is empty.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch the raw text for a source id.
    async fn fetch_text(&self, source_id: &str) -> Result<Option<SourceText>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_joins_segments() {
        let source = SourceText::Timed(vec![
            TimedSegment::new(0.0, 5.0, "Hello world".to_string()),
            TimedSegment::new(5.0, 10.0, "This is a test".to_string()),
        ]);
        assert_eq!(source.full_text(), "Hello world This is a test");
    }

    #[test]
    fn test_is_empty() {
        assert!(SourceText::Plain("   \n".to_string()).is_empty());
        assert!(!SourceText::Plain("text".to_string()).is_empty());
        assert!(SourceText::Timed(vec![]).is_empty());
        assert!(
            SourceText::Timed(vec![TimedSegment::new(0.0, 1.0, "  ".to_string())]).is_empty()
        );
    }
}
