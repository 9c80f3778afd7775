//! Response types for ingestion and question answering

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{FileType, TextChunk};

/// Outcome of ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStatus {
    /// ID assigned to the document
    pub document_id: Uuid,
    /// Original filename
    pub filename: String,
    /// Detected format
    pub file_type: FileType,
    /// Characters of extracted text
    pub characters: usize,
    /// Chunks indexed
    pub chunks: usize,
    /// Pages (PDF) or paragraphs (DOCX) read
    pub sections: usize,
    /// Sections that yielded no text
    pub empty_sections: usize,
    /// Wall-clock processing time
    pub processing_time_ms: u64,
}

/// Upload outcome reported to the client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadOutcome {
    Ok,
    Error,
}

/// Body of `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: UploadOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

impl UploadResponse {
    /// Successful ingestion
    pub fn ok(status: &IngestStatus) -> Self {
        let mut message = format!(
            "Document '{}' processed and indexed successfully.",
            status.filename
        );
        if status.file_type == FileType::Pdf && status.empty_sections > 0 {
            message.push_str(&format!(
                " {} of {} pages had no extractable text and were skipped.",
                status.empty_sections, status.sections
            ));
        }

        Self {
            status: UploadOutcome::Ok,
            message,
            document_id: Some(status.document_id),
            chunks: Some(status.chunks),
        }
    }

    /// Failed ingestion
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: UploadOutcome::Error,
            message: message.into(),
            document_id: None,
            chunks: None,
        }
    }
}

/// A chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub score: f32,
}

/// Chunks ordered by descending similarity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub results: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(results: Vec<ScoredChunk>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Highest-scoring result
    pub fn top(&self) -> Option<&ScoredChunk> {
        self.results.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.results.iter()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// How an answer was produced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// LLM answer grounded in retrieved chunks
    Generated,
    /// No LLM configured; the retrieved context is returned verbatim
    ContextOnly,
    /// Retrieval returned nothing usable; the LLM was not called
    InsufficientContext,
    /// The LLM failed; a fixed apology is returned instead
    Degraded,
}

/// Answer text plus the context it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    /// Chunks placed in the prompt, in prompt order
    pub context: Vec<ScoredChunk>,
}

/// Source attribution returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub document_id: Uuid,
    pub filename: String,
    pub chunk_index: u32,
    pub score: f32,
    pub snippet: String,
}

impl SourceRef {
    const SNIPPET_CHARS: usize = 200;

    pub fn from_scored(scored: &ScoredChunk) -> Self {
        Self {
            document_id: scored.chunk.document_id,
            filename: scored.chunk.filename.clone(),
            chunk_index: scored.chunk.index,
            score: scored.score,
            snippet: truncate_chars(&scored.chunk.content, Self::SNIPPET_CHARS),
        }
    }
}

/// Body of a successful `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub kind: AnswerKind,
    pub sources: Vec<SourceRef>,
}

impl From<Answer> for AskResponse {
    fn from(answer: Answer) -> Self {
        Self {
            sources: answer.context.iter().map(SourceRef::from_scored).collect(),
            answer: answer.text,
            kind: answer.kind,
        }
    }
}

/// Body of `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub has_index: bool,
    pub chunks: usize,
    pub documents: usize,
    pub embedding_model: String,
    pub dimensions: usize,
    pub llm: String,
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_upload_response_serialization() {
        let body = serde_json::to_value(UploadResponse::error("bad file")).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "bad file");
        assert!(body.get("document_id").is_none());
    }

    #[test]
    fn test_upload_message_reports_pages_without_text() {
        let mut status = IngestStatus {
            document_id: Uuid::new_v4(),
            filename: "scan.pdf".to_string(),
            file_type: FileType::Pdf,
            characters: 120,
            chunks: 1,
            sections: 4,
            empty_sections: 3,
            processing_time_ms: 5,
        };
        let response = UploadResponse::ok(&status);
        assert!(response
            .message
            .ends_with("3 of 4 pages had no extractable text and were skipped."));

        status.empty_sections = 0;
        assert!(!UploadResponse::ok(&status).message.contains("pages"));
    }

    #[test]
    fn test_answer_kind_serialization() {
        let json = serde_json::to_string(&AnswerKind::InsufficientContext).unwrap();
        assert_eq!(json, "\"insufficient_context\"");
    }
}
