//! Ollama-based providers for embeddings and LLM

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

use super::embedding::{check_vector, ensure_not_blank, EmbeddingProvider};
use super::http::{build_client, RetryPolicy};
use super::llm::LlmProvider;

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_retries: u32) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(timeout, max_retries),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed one text with `model`
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = &format!("{}/api/embeddings", self.base_url);
        let client = &self.client;

        self.retry
            .run(
                |d| Error::embedding(format!("Ollama embedding timed out after {:?}", d)),
                move || async move {
                    let response = client
                        .post(url)
                        .json(&EmbedRequest {
                            model,
                            prompt: text,
                        })
                        .send()
                        .await
                        .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                    if !response.status().is_success() {
                        return Err(Error::embedding(format!(
                            "Embedding failed: HTTP {}",
                            response.status()
                        )));
                    }

                    let body: EmbedResponse = response.json().await.map_err(|e| {
                        Error::embedding(format!("Failed to parse embedding response: {}", e))
                    })?;

                    Ok(body.embedding)
                },
            )
            .await
    }

    /// Complete `prompt` with `model`
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = &format!("{}/api/generate", self.base_url);
        let client = &self.client;

        tracing::info!("Generating answer with model: {}", model);

        self.retry
            .run(
                |d| Error::llm(format!("Ollama generation timed out after {:?}", d)),
                move || async move {
                    let request = GenerateRequest {
                        model,
                        prompt,
                        stream: false,
                        options: GenerateOptions {
                            temperature,
                            num_predict: max_tokens,
                        },
                    };

                    let response = client
                        .post(url)
                        .json(&request)
                        .send()
                        .await
                        .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::llm(format!(
                            "Generation failed: HTTP {} - {}",
                            status, body
                        )));
                    }

                    let body: GenerateResponse = response.json().await.map_err(|e| {
                        Error::llm(format!("Failed to parse generation response: {}", e))
                    })?;

                    Ok(body.response)
                },
            )
            .await
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create from configuration
    pub fn new(config: &OllamaConfig, dimensions: usize, timeout: Duration) -> Result<Self> {
        let client = OllamaClient::new(&config.base_url, timeout, 0)?;
        Ok(Self::from_client(Arc::new(client), config.embed_model.clone(), dimensions))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String, dimensions: usize) -> Self {
        Self {
            client,
            model,
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        ensure_not_blank(text)?;
        let vector = EmbeddingVector::new(self.client.embed(&self.model, text).await?);
        check_vector(&vector, self.dimensions)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        format!("ollama/{}", self.model)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaLlm {
    /// Create from an existing client
    pub fn new(
        client: Arc<OllamaClient>,
        model: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            model,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client
            .generate(&self.model, prompt, self.temperature, self.max_tokens)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
