//! Query-time retrieval: embed the question, search the index

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::RetrievalResult;

use super::index::VectorIndex;

/// Fetches the chunks most similar to a question
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            min_score: None,
        }
    }

    /// Drop results scoring below `min_score`
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve up to `top_k` chunks for `question`, best first.
    ///
    /// `top_k` is clamped to `[1, index size]`. An empty index fails before the
    /// embedder is called.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<RetrievalResult> {
        if question.trim().is_empty() {
            return Err(Error::EmptyInput("question is empty".to_string()));
        }

        let size = self.index.len();
        if size == 0 {
            return Err(Error::EmptyIndex);
        }
        let k = top_k.clamp(1, size);

        let query = self.embedder.embed(question).await?;
        let mut results = self.index.search(&query, k)?;

        if let Some(min_score) = self.min_score {
            results.retain(|r| r.score >= min_score);
        }

        tracing::debug!(
            "Retrieved {} chunks (top_k={}, best score {:?})",
            results.len(),
            k,
            results.first().map(|r| r.score)
        );

        Ok(RetrievalResult::new(results))
    }
}
