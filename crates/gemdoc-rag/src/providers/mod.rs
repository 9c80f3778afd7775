//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based so the pipeline can switch between the in-process MiniLM
//! sentence embedder, the hashing embedder, a local Ollama server and the
//! Gemini API.

pub mod embedding;
pub mod gemini;
pub mod hash;
pub mod http;
pub mod llm;
pub mod ollama;
pub mod onnx;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingBackend, LlmBackend, RagConfig};
use crate::error::Result;

pub use embedding::{embed_batch, EmbeddingProvider};
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use hash::HashEmbedder;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use onnx::OnnxEmbedder;

/// Build the embedder selected by `embeddings.backend`.
///
/// The ONNX backend downloads its model on first use.
pub async fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let dimensions = config.embeddings.resolved_dimensions();
    let timeout = Duration::from_secs(config.embeddings.timeout_secs);

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
        EmbeddingBackend::Onnx => Arc::new(OnnxEmbedder::new(&config.embeddings).await?),
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(dimensions)),
        EmbeddingBackend::Ollama => {
            Arc::new(OllamaEmbedder::new(&config.ollama, dimensions, timeout)?)
        }
        EmbeddingBackend::Gemini => {
            Arc::new(GeminiEmbedder::new(&config.gemini, dimensions, timeout)?)
        }
    };

    tracing::info!(
        "Embedding provider: {} ({}, {} dims)",
        embedder.name(),
        embedder.model_id(),
        embedder.dimensions()
    );
    Ok(embedder)
}

/// Build the LLM selected by `llm.backend`.
///
/// `None` means answers fall back to the retrieved context; this is also the
/// outcome for the Gemini backend when no API key is configured.
pub fn llm_from_config(config: &RagConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    let llm: Option<Arc<dyn LlmProvider>> = match config.llm.backend {
        LlmBackend::Gemini if config.gemini.api_key.is_none() => {
            tracing::warn!("GEMINI_API_KEY not set, answers will return retrieved context only");
            None
        }
        LlmBackend::Gemini => Some(Arc::new(GeminiClient::new(&config.gemini, &config.llm)?)),
        LlmBackend::Ollama => {
            let client = OllamaClient::new(
                &config.ollama.base_url,
                Duration::from_secs(config.llm.timeout_secs),
                config.llm.max_retries,
            )?;
            Some(Arc::new(OllamaLlm::new(
                Arc::new(client),
                config.ollama.generate_model.clone(),
                config.llm.temperature,
                config.llm.max_output_tokens,
            )))
        }
        LlmBackend::None => None,
    };

    if let Some(llm) = &llm {
        tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());
    }
    Ok(llm)
}
