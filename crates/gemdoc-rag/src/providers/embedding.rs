//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

/// Trait for generating text embeddings
///
/// One instance serves both chunks and queries so the two live in the same
/// vector space.
///
/// Implementations:
/// - `OnnxEmbedder`: in-process all-MiniLM-L6-v2 sentence embeddings
/// - `HashEmbedder`: in-process feature hashing
/// - `OllamaEmbedder`: local Ollama server (nomic-embed-text)
/// - `GeminiEmbedder`: Gemini embedContent API (text-embedding-004)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    ///
    /// Empty or whitespace-only text fails with `Error::EmptyInput`.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Get embedding dimensions (e.g., 384 for MiniLM, 768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Identifier of the model; vectors from different models are not comparable
    fn model_id(&self) -> String;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Embed many texts with at most `concurrency` requests in flight.
///
/// Output order matches input order; the first failure aborts the batch.
pub async fn embed_batch(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    concurrency: usize,
) -> Result<Vec<EmbeddingVector>> {
    // Collected first so the stream type is concrete (rustc #102211: a lazy
    // `Map` here makes the future "not general enough" to be `Send`)
    let futures: Vec<_> = texts.iter().map(|text| embedder.embed(text)).collect();
    stream::iter(futures)
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Reject text that has nothing to embed
pub fn ensure_not_blank(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::EmptyInput("cannot embed empty text".to_string()));
    }
    Ok(())
}

/// Check a vector returned by a remote model: expected width, finite values only
pub fn check_vector(vector: &EmbeddingVector, expected: usize) -> Result<()> {
    if vector.dim() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: vector.dim(),
        });
    }
    if let Some(i) = vector.first_non_finite() {
        return Err(Error::embedding(format!(
            "embedding has a non-finite value at position {}",
            i
        )));
    }
    Ok(())
}
