//! Fixed-size overlapping text chunking

use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::TextChunk;

/// A chunk span before it is attached to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Character offset of the first char, inclusive
    pub start: usize,
    /// Character offset past the last char
    pub end: usize,
    pub content: String,
}

/// Sliding-window chunker over Unicode scalar values
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Distance between consecutive window starts
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split text into windows of at most `chunk_size` chars.
    ///
    /// Whitespace-only windows are skipped; the last window may be shorter.
    pub fn split(&self, text: &str) -> Vec<ChunkSpan> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut spans = Vec::new();

        let mut start = 0usize;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            let window = &chars[start..end];

            if window.iter().any(|c| !c.is_whitespace()) {
                spans.push(ChunkSpan {
                    start,
                    end,
                    content: window.iter().collect(),
                });
            }

            if end == total {
                break;
            }
            start += self.step();
        }

        spans
    }

    /// Chunk a document's extracted text
    pub fn chunk(&self, document_id: Uuid, filename: &str, text: &str) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = self
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                TextChunk::new(document_id, filename, i as u32, span.start, span.end, span.content)
            })
            .collect();

        tracing::debug!(
            "Chunked '{}' into {} chunks (size={}, overlap={})",
            filename,
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        }
    }
}

/// Rebuild a document's text from its chunks, dropping the overlapping prefixes.
///
/// Gaps left by skipped whitespace-only windows are filled with a single space.
pub fn reconstruct(chunks: &[TextChunk]) -> String {
    let mut ordered: Vec<&TextChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);

    let mut out = String::new();
    let mut covered = 0usize;

    for chunk in ordered {
        if chunk.char_start > covered && covered > 0 {
            out.push(' ');
        }
        let skip = covered.saturating_sub(chunk.char_start);
        out.extend(chunk.content.chars().skip(skip));
        covered = covered.max(chunk.char_end);
    }

    out
}
