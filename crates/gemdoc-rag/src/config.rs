//! Configuration for the document Q&A service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Prompt assembly configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// LLM backend configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Gemini API settings (shared by the LLM and embedding clients)
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Ollama settings (shared by the LLM and embedding clients)
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config: RagConfig = toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("Invalid config file {}: {}", path.display(), e))
                })?;
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            None => RagConfig::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from process environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (environment or test map)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.gemini.model = model;
        }
        if let Some(host) = lookup("GEMDOC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GEMDOC_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid GEMDOC_PORT value: {}", port),
            }
        }
        if let Some(backend) = lookup("GEMDOC_EMBEDDER") {
            match backend.to_lowercase().as_str() {
                "onnx" => self.embeddings.backend = EmbeddingBackend::Onnx,
                "hash" => self.embeddings.backend = EmbeddingBackend::Hash,
                "ollama" => self.embeddings.backend = EmbeddingBackend::Ollama,
                "gemini" => self.embeddings.backend = EmbeddingBackend::Gemini,
                other => tracing::warn!("Ignoring unknown GEMDOC_EMBEDDER value: {}", other),
            }
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == Some(0) {
            return Err(Error::Config("embeddings.dimensions must be positive".to_string()));
        }
        if self.embeddings.max_length == 0 {
            return Err(Error::Config("embeddings.max_length must be positive".to_string()));
        }
        if self.embeddings.concurrency == 0 {
            return Err(Error::Config("embeddings.concurrency must be positive".to_string()));
        }
        if self.retrieval.default_top_k == 0 {
            return Err(Error::Config("retrieval.default_top_k must be positive".to_string()));
        }
        if self.generation.max_context_chars == 0 {
            return Err(Error::Config(
                "generation.max_context_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS for a browser frontend
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Which embedding model computes vectors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process sentence-transformer (all-MiniLM-L6-v2) on ONNX Runtime
    #[default]
    Onnx,
    /// In-process feature hashing, no model files or network
    Hash,
    /// Local Ollama server
    Ollama,
    /// Gemini embedContent API
    Gemini,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding backend
    pub backend: EmbeddingBackend,
    /// Sentence-transformers model for the ONNX backend
    pub model: String,
    /// Where the ONNX model and tokenizer are cached
    pub cache_dir: PathBuf,
    /// Token limit per text for the ONNX backend; longer input is truncated
    pub max_length: usize,
    /// Embedding dimensions; unset uses the backend's native width
    pub dimensions: Option<usize>,
    /// Maximum in-flight embedding requests per document
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Configured width, or the backend default: 384 for MiniLM and hashing,
    /// 768 for nomic-embed-text and text-embedding-004
    pub fn resolved_dimensions(&self) -> usize {
        self.dimensions.unwrap_or(match self.backend {
            EmbeddingBackend::Onnx | EmbeddingBackend::Hash => 384,
            EmbeddingBackend::Ollama | EmbeddingBackend::Gemini => 768,
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model: "all-MiniLM-L6-v2".to_string(),
            cache_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_length: 256,
            dimensions: None,
            concurrency: 4,
            timeout_secs: 30,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// top_k used when a request does not specify one
    pub default_top_k: usize,
    /// Drop results scoring below this cosine similarity
    pub min_score: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            min_score: None,
        }
    }
}

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Budget for retrieved context inside the prompt, in characters
    pub max_context_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 12_000,
        }
    }
}

/// Which service generates answers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Gemini generateContent API (falls back to context-only without an API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
    /// No LLM; answers are the retrieved context
    None,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generation backend
    pub backend: LlmBackend,
    /// Temperature for generation
    pub temperature: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed requests (0 = fail fast, retry at a higher layer)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Gemini,
            temperature: 0.2,
            max_output_tokens: 1024,
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (usually supplied through GEMINI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model
    pub model: String,
    /// Embedding model
    pub embed_model: String,
    /// API base URL
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            embed_model: "text-embedding-004".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Ollama settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.default_top_k, 3);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Onnx);
        assert_eq!(config.embeddings.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embeddings.resolved_dimensions(), 384);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMDOC_PORT", "9001"),
            ("GEMDOC_EMBEDDER", "ollama"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Ollama);
        assert_eq!(config.embeddings.resolved_dimensions(), 768);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut config = RagConfig::default();
        config.apply_overrides(|k| (k == "GEMINI_API_KEY").then(|| "  ".to_string()));
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let raw = r#"
            [embeddings]
            backend = "hash"

            [chunking]
            chunk_size = 500

            [llm]
            backend = "none"
        "#;
        let config: RagConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Hash);
        assert_eq!(config.embeddings.max_length, 256);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 80);
        assert_eq!(config.llm.backend, LlmBackend::None);
        assert_eq!(config.server.port, 8000);
    }
}
