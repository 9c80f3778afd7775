//! Error types for the document Q&A pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// File is neither PDF nor DOCX
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// File is corrupt, unparsable or contains no text
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Empty or whitespace-only text where content is required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Malformed request body or missing field
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Query issued before any document was ingested
    #[error("No indexed document found. Please upload a document first.")]
    EmptyIndex,

    /// Vector length differs from the index dimensionality
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding backend failed or timed out
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// LLM backend failed, timed out or returned a malformed response
    #[error("LLM service error: {0}")]
    LlmService(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding service error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingService(message.into())
    }

    /// Create an LLM service error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::LlmService(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// External-service failures a caller may retry at a higher layer.
    ///
    /// Distinguishes "the service is down" from "nothing matched".
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EmbeddingService(_) | Self::LlmService(_))
    }

    /// Short machine-readable tag used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Extraction { .. } => "extraction_error",
            Self::EmptyInput(_) => "empty_input",
            Self::BadRequest(_) => "bad_request",
            Self::EmptyIndex => "empty_index",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::EmbeddingService(_) => "embedding_service_error",
            Self::LlmService(_) => "llm_service_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedFormat(_)
            | Self::Extraction { .. }
            | Self::EmptyInput(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::EmptyIndex => StatusCode::NOT_FOUND,
            Self::EmbeddingService(_) => StatusCode::BAD_GATEWAY,
            Self::LlmService(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DimensionMismatch { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "type": self.kind(),
        }));

        (status, body).into_response()
    }
}
