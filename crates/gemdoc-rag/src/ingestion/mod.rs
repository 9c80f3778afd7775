//! Document ingestion: text extraction and chunking

pub mod chunker;
pub mod parser;

pub use chunker::{reconstruct, ChunkSpan, TextChunker};
pub use parser::{normalize_text, ExtractedText, TextExtractor};
