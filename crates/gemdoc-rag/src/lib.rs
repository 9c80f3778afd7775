//! gemdoc-rag: question answering over uploaded PDF and DOCX documents
//!
//! Uploaded documents are extracted to text, split into overlapping chunks,
//! embedded and kept in an in-memory vector index. Questions are embedded with
//! the same model, the closest chunks are retrieved, and an LLM answers from
//! those chunks only.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use types::{
    document::{Document, EmbeddingVector, FileType, TextChunk},
    query::AskRequest,
    response::{Answer, AnswerKind, AskResponse, IngestStatus},
};
