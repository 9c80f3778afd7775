//! Gemini API clients for answer generation and embeddings
//!
//! Both talk to the public Generative Language API with an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{GeminiConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

use super::embedding::{check_vector, ensure_not_blank, EmbeddingProvider};
use super::http::{build_client, RetryPolicy};
use super::llm::LlmProvider;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// POST a JSON body and decode the JSON reply, mapping every failure through `to_error`
async fn post_json<B, R>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &B,
    to_error: fn(String) -> Error,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .header(API_KEY_HEADER, api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| to_error(format!("Gemini request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(to_error(format!("Gemini request failed ({}): {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| to_error(format!("Failed to parse Gemini response: {}", e)))
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate. A response without candidates (blocked
    /// prompt) is an error; a candidate without parts is empty text.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "unspecified".to_string());
            return Err(Error::llm(format!(
                "Gemini returned no candidates (block reason: {})",
                reason
            )));
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                tracing::debug!("Gemini finished with reason {}", reason);
            }
        }

        Ok(candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

/// Gemini generateContent client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a client; fails when no API key is configured
    pub fn new(gemini: &GeminiConfig, llm: &LlmConfig) -> Result<Self> {
        let api_key = gemini
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))?;
        let timeout = Duration::from_secs(llm.timeout_secs);

        Ok(Self {
            client: build_client(timeout)?,
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: gemini.model.clone(),
            temperature: llm.temperature,
            max_output_tokens: llm.max_output_tokens,
            retry: RetryPolicy::new(timeout, llm.max_retries),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = &self.endpoint();
        let request = &GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };
        let client = &self.client;
        let api_key = self.api_key.as_str();

        tracing::info!("Generating answer with model: {}", self.model);

        let response: GenerateResponse = self
            .retry
            .run(
                |d| Error::llm(format!("Gemini generation timed out after {:?}", d)),
                move || post_json(client, url, api_key, request, Error::LlmService),
            )
            .await?;

        response.into_text()
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

/// Gemini embedContent client
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl GeminiEmbedder {
    /// Create an embedder; fails when no API key is configured
    pub fn new(gemini: &GeminiConfig, dimensions: usize, timeout: Duration) -> Result<Self> {
        let api_key = gemini.api_key.clone().ok_or_else(|| {
            Error::Config("GEMINI_API_KEY is required for the gemini embedder".to_string())
        })?;

        Ok(Self {
            client: build_client(timeout)?,
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: gemini.embed_model.clone(),
            dimensions,
            retry: RetryPolicy::new(timeout, 0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        ensure_not_blank(text)?;

        let url = &format!("{}/models/{}:embedContent", self.base_url, self.model);
        let request = &EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        };
        let client = &self.client;
        let api_key = self.api_key.as_str();

        let response: EmbedResponse = self
            .retry
            .run(
                |d| Error::embedding(format!("Gemini embedding timed out after {:?}", d)),
                move || post_json(client, url, api_key, request, Error::EmbeddingService),
            )
            .await?;

        let vector = EmbeddingVector::new(response.embedding.values);
        check_vector(&vector, self.dimensions)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        format!("gemini/{}", self.model)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
