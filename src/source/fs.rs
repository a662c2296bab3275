//! Filesystem text source implementation.
//!
//! Looks up `<root>/<id>.json` (timed transcript segments) first, then
//! `<root>/<id>.txt` (plain document). A missing file is "not found", not
//! an error.

use super::{SourceText, TextSource, TimedSegment};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text source backed by a directory of transcript and document files.
pub struct FsTextSource {
    root: PathBuf,
}

impl FsTextSource {
    /// Create a new filesystem text source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, source_id: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", source_id, extension))
    }

    /// Source ids may name files but never paths.
    fn validate_id(source_id: &str) -> Result<()> {
        if source_id.is_empty()
            || source_id.contains(std::path::MAIN_SEPARATOR)
            || source_id.contains("..")
        {
            return Err(SvarError::InvalidInput(format!(
                "Invalid source id: {}",
                source_id
            )));
        }
        Ok(())
    }

    async fn read_timed(&self, path: &Path) -> Result<SourceText> {
        let content = tokio::fs::read_to_string(path).await?;
        let segments: Vec<TimedSegment> = serde_json::from_str(&content)
            .map_err(|e| SvarError::Source(format!("Malformed transcript {:?}: {}", path, e)))?;
        Ok(SourceText::Timed(segments))
    }
}

#[async_trait]
impl TextSource for FsTextSource {
    async fn fetch_text(&self, source_id: &str) -> Result<Option<SourceText>> {
        Self::validate_id(source_id)?;

        let timed_path = self.path_for(source_id, "json");
        if timed_path.exists() {
            debug!("Reading timed transcript from {:?}", timed_path);
            return Ok(Some(self.read_timed(&timed_path).await?));
        }

        let plain_path = self.path_for(source_id, "txt");
        if plain_path.exists() {
            debug!("Reading plain document from {:?}", plain_path);
            let text = tokio::fs::read_to_string(&plain_path).await?;
            return Ok(Some(SourceText::Plain(text)));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_source_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTextSource::new(dir.path());

        let result = source.fetch_text("absent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_plain_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc1.txt"), "Some doc text").unwrap();

        let source = FsTextSource::new(dir.path());
        let text = source.fetch_text("doc1").await.unwrap().unwrap();

        match text {
            SourceText::Plain(t) => assert_eq!(t, "Some doc text"),
            SourceText::Timed(_) => panic!("expected plain text"),
        }
    }

    #[tokio::test]
    async fn test_timed_transcript_preferred_over_plain() {
        let dir = tempfile::tempdir().unwrap();
        let segments = r#"[{"start_seconds": 0.0, "end_seconds": 4.5, "text": "Hello"}]"#;
        std::fs::write(dir.path().join("vid1.json"), segments).unwrap();
        std::fs::write(dir.path().join("vid1.txt"), "ignored").unwrap();

        let source = FsTextSource::new(dir.path());
        let text = source.fetch_text("vid1").await.unwrap().unwrap();

        match text {
            SourceText::Timed(segs) => {
                assert_eq!(segs.len(), 1);
                assert_eq!(segs[0].text, "Hello");
            }
            SourceText::Plain(_) => panic!("expected timed segments"),
        }
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTextSource::new(dir.path());

        assert!(source.fetch_text("../etc/passwd").await.is_err());
        assert!(source.fetch_text("").await.is_err());
    }
}
