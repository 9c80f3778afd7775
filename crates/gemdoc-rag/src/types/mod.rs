//! Core types for the document Q&A pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{Document, EmbeddingVector, FileType, TextChunk};
pub use query::AskRequest;
pub use response::{
    Answer, AnswerKind, AskResponse, IngestStatus, RetrievalResult, ScoredChunk, SourceRef,
    StatusResponse, UploadOutcome, UploadResponse,
};
