//! Document, chunk and embedding types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Supported upload formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect file type from a MIME content type
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect the type of an upload from its filename.
    ///
    /// The extension decides. The declared content type is only consulted
    /// for filenames without an extension.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let detected = if extension.is_empty() {
            content_type.and_then(Self::from_mime)
        } else {
            Self::from_extension(extension)
        };
        if let Some(file_type) = detected {
            return Ok(file_type);
        }

        let guessed = mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string())
            .or_else(|| content_type.map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Err(Error::UnsupportedFormat(format!(
            "'{}' ({}). Please upload PDF or DOCX.",
            filename, guessed
        )))
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An uploaded file awaiting extraction
///
/// Consumed by ingestion; the raw bytes are dropped once text has been extracted.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded by user
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Raw file content
    pub data: Vec<u8>,
    /// SHA-256 of the raw bytes
    pub content_hash: String,
}

impl Document {
    /// Create a new document with a fresh ID
    pub fn new(filename: impl Into<String>, file_type: FileType, data: Vec<u8>) -> Self {
        let content_hash = hash_bytes(&data);
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            file_type,
            data,
            content_hash,
        }
    }

    /// Create a document, detecting its type from the filename and content type
    pub fn from_upload(
        filename: impl Into<String>,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<Self> {
        let filename = filename.into();
        let file_type = FileType::detect(&filename, content_type)?;
        Ok(Self::new(filename, file_type, data))
    }

    /// File size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A contiguous slice of a document's extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Source filename (for attribution)
    pub filename: String,
    /// Position of this chunk within its document
    pub index: u32,
    /// Character span in the extracted text, end exclusive
    pub char_start: usize,
    pub char_end: usize,
    /// Text content
    pub content: String,
}

impl TextChunk {
    /// Create a new chunk
    pub fn new(
        document_id: Uuid,
        filename: impl Into<String>,
        index: u32,
        char_start: usize,
        char_end: usize,
        content: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            filename: filename.into(),
            index,
            char_start,
            char_end,
            content,
        }
    }
}

/// Immutable, cheaply clonable embedding vector
#[derive(Clone, PartialEq)]
pub struct EmbeddingVector(Arc<[f32]>);

impl EmbeddingVector {
    /// Wrap raw values
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Position of the first NaN or infinite component
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|x| !x.is_finite())
    }

    /// Borrow the values
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// L2 norm
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Unit-length copy; a zero vector stays zero
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|x| x / norm).collect())
    }

    /// Dot product with another vector of the same length
    pub fn dot(&self, other: &[f32]) -> f32 {
        self.0.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }
}

impl fmt::Debug for EmbeddingVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmbeddingVector(dim={})", self.dim())
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Hash content for attribution and logging
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
