//! Content chunking for breaking source text into retrievable segments.
//!
//! Plain documents are split on sentence boundaries against a word budget;
//! timed transcripts merge consecutive segments until the budget is met.

use crate::source::{SourceText, TimedSegment};
use serde::{Deserialize, Serialize};

/// A chunk of source text with its position metadata.
///
/// Offsets are cumulative word counts for plain documents and seconds for
/// timed transcripts. `start_offset <= end_offset` always holds, and chunks
/// for one source come out in non-decreasing offset order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Source this chunk belongs to.
    pub source_id: String,
    /// Text content of this chunk.
    pub text: String,
    /// Offset at which the chunk starts.
    pub start_offset: f64,
    /// Offset at which the chunk ends.
    pub end_offset: f64,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(source_id: String, text: String, start_offset: f64, end_offset: f64) -> Self {
        Self {
            source_id,
            text,
            start_offset,
            end_offset,
        }
    }

    /// Format the start offset for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start_offset)
    }
}

/// Word-budget chunker.
pub struct TextChunker {
    target_word_count: usize,
}

impl TextChunker {
    /// Default word budget per chunk.
    pub const DEFAULT_TARGET_WORD_COUNT: usize = 60;

    /// Create a chunker with the given word budget per chunk.
    pub fn new(target_word_count: usize) -> Self {
        Self {
            target_word_count: target_word_count.max(1),
        }
    }

    /// Split a source into chunks, dispatching on its offset mode.
    pub fn chunk(&self, source_id: &str, source: &SourceText) -> Vec<Chunk> {
        match source {
            SourceText::Plain(text) => self.chunk_plain(source_id, text),
            SourceText::Timed(segments) => self.chunk_timed(source_id, segments),
        }
    }

    /// Chunk a plain document on sentence boundaries.
    ///
    /// A sentence unit is the maximal run of characters up to and including
    /// a terminal `.`, `!`, `?`, or newline. Buffered units are flushed
    /// before appending a unit that would push the accumulated word count
    /// past the budget, and immediately once the buffer reaches it. Text
    /// with no boundaries at all becomes a single chunk.
    pub fn chunk_plain(&self, source_id: &str, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_words = 0usize;
        let mut chunk_start_words = 0usize;

        for unit in sentence_units(text) {
            let unit_words = unit.split_whitespace().count();

            if buffer_words > 0 && buffer_words + unit_words > self.target_word_count {
                emit_plain(&mut chunks, source_id, &buffer, chunk_start_words, buffer_words);
                chunk_start_words += buffer_words;
                buffer.clear();
                buffer_words = 0;
            }

            buffer.push_str(unit);
            buffer_words += unit_words;

            if buffer_words >= self.target_word_count {
                emit_plain(&mut chunks, source_id, &buffer, chunk_start_words, buffer_words);
                chunk_start_words += buffer_words;
                buffer.clear();
                buffer_words = 0;
            }
        }

        emit_plain(&mut chunks, source_id, &buffer, chunk_start_words, buffer_words);

        chunks
    }

    /// Chunk a timed transcript by merging consecutive segments.
    ///
    /// A chunk closes as soon as the merged word count reaches the budget,
    /// spanning from the first merged segment's start time to the last
    /// one's end time.
    pub fn chunk_timed(&self, source_id: &str, segments: &[TimedSegment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut run_texts: Vec<&str> = Vec::new();
        let mut run_start = 0.0;
        let mut run_end = 0.0;
        let mut run_words = 0usize;

        for segment in segments {
            let trimmed = segment.text.trim();
            if trimmed.is_empty() {
                continue;
            }

            if run_texts.is_empty() {
                run_start = segment.start_seconds;
            }
            run_end = segment.end_seconds;
            run_words += trimmed.split_whitespace().count();
            run_texts.push(trimmed);

            if run_words >= self.target_word_count {
                chunks.push(Chunk::new(
                    source_id.to_string(),
                    run_texts.join(" "),
                    run_start,
                    run_end,
                ));
                run_texts.clear();
                run_words = 0;
            }
        }

        if !run_texts.is_empty() {
            chunks.push(Chunk::new(
                source_id.to_string(),
                run_texts.join(" "),
                run_start,
                run_end,
            ));
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TARGET_WORD_COUNT)
    }
}

/// Emit a buffered run of sentence units as a chunk, unless it trims away
/// to nothing.
fn emit_plain(
    chunks: &mut Vec<Chunk>,
    source_id: &str,
    buffer: &str,
    start_words: usize,
    buffer_words: usize,
) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(Chunk::new(
            source_id.to_string(),
            trimmed.to_string(),
            start_words as f64,
            (start_words + buffer_words) as f64,
        ));
    }
}

/// Split text into sentence units.
///
/// Each unit is the maximal run of characters up to and including a
/// terminal `.`, `!`, `?`, or newline; any trailing remainder is its own
/// unit.
fn sentence_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?' | '\n') {
            let end = idx + ch.len_utf8();
            units.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        units.push(&text[start..]);
    }

    units
}

/// Format an offset in seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
