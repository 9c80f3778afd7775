//! In-process sentence embeddings with ONNX Runtime
//!
//! Runs sentence-transformers/all-MiniLM-L6-v2 (384 dimensions): tokenize,
//! run the encoder, mean-pool the last hidden state over the attention mask,
//! then L2-normalize. Model and tokenizer are fetched from Hugging Face on
//! first use and cached on disk.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

use super::embedding::{check_vector, ensure_not_blank, EmbeddingProvider};
use super::http::build_client;

const HF_BASE: &str = "https://huggingface.co/sentence-transformers";

/// Timeout for the one-off model download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Sentence-transformer embedder backed by an ONNX Runtime session
pub struct OnnxEmbedder {
    /// `Session::run` needs exclusive access
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model: String,
    dimensions: usize,
    max_length: usize,
}

impl OnnxEmbedder {
    /// Load the configured model, downloading it into `cache_dir` if needed
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", config.model);

        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create model cache {}: {}",
                config.cache_dir.display(),
                e
            ))
        })?;

        let model_path = config.cache_dir.join("model.onnx");
        let tokenizer_path = config.cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            download(&config.model, "onnx/model.onnx", &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download(&config.model, "tokenizer.json", &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::Config(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Config(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::Config(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::Config(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Config(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder ready ({} dims)", config.resolved_dimensions());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model: config.model.clone(),
            dimensions: config.resolved_dimensions(),
            max_length: config.max_length,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        ensure_not_blank(text)?;

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();
        let max_length = self.max_length;

        let values = tokio::task::spawn_blocking(move || {
            encode(&mut session.lock(), &tokenizer, &text, max_length)
        })
        .await
        .map_err(|e| Error::internal(format!("Embedding task failed: {}", e)))??;

        let vector = EmbeddingVector::new(values);
        check_vector(&vector, self.dimensions)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        format!("onnx/{}", self.model)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Tokenize one text, run the encoder and pool its output
fn encode(
    session: &mut Session,
    tokenizer: &Tokenizer,
    text: &str,
    max_length: usize,
) -> Result<Vec<f32>> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

    let len = encoding.get_ids().len().min(max_length);
    let to_i64 =
        |values: &[u32]| -> Vec<i64> { values[..len].iter().map(|&v| v as i64).collect() };
    let input_ids = to_i64(encoding.get_ids());
    let attention_mask = to_i64(encoding.get_attention_mask());
    let token_type_ids = to_i64(encoding.get_type_ids());

    let tensor = |values: Vec<i64>, what: &str| {
        Tensor::from_array((vec![1, len], values.into_boxed_slice()))
            .map_err(|e| Error::embedding(format!("{} tensor creation failed: {}", what, e)))
    };
    let inputs = vec![
        ("input_ids", tensor(input_ids, "Input")?.into_dyn()),
        ("attention_mask", tensor(attention_mask.clone(), "Attention mask")?.into_dyn()),
        ("token_type_ids", tensor(token_type_ids, "Token type")?.into_dyn()),
    ];

    let outputs = session
        .run(inputs)
        .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

    let output_iter: Vec<_> = outputs.iter().collect();
    let output = output_iter
        .iter()
        .find(|(name, _)| *name == "last_hidden_state")
        .or_else(|| output_iter.first())
        .map(|(_, v)| v)
        .ok_or_else(|| Error::embedding("Model produced no output tensor"))?;

    let (shape, hidden) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

    let hidden_size = shape
        .get(2)
        .map(|&d| d as usize)
        .ok_or_else(|| Error::embedding(format!("Unexpected output shape {:?}", &shape[..])))?;

    Ok(mean_pool(hidden, &attention_mask, len, hidden_size))
}

/// Average token states where the mask is set, then scale to unit length
pub fn mean_pool(hidden: &[f32], mask: &[i64], seq_len: usize, hidden_size: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (j, &m) in mask.iter().enumerate().take(seq_len) {
        if m == 0 {
            continue;
        }
        let Some(row) = hidden.get(j * hidden_size..(j + 1) * hidden_size) else {
            break;
        };
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for value in &mut pooled {
            *value /= count;
        }
    }

    let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut pooled {
            *value /= norm;
        }
    }
    pooled
}

/// Fetch `file` of a sentence-transformers model from Hugging Face
async fn download(model: &str, file: &str, path: &Path) -> Result<()> {
    let url = format!("{}/{}/resolve/main/{}", HF_BASE, model, file);
    tracing::info!("Downloading {}", url);

    let client = build_client(DOWNLOAD_TIMEOUT)?;
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::Config(format!("Failed to download {}: {}", file, e)))?;

    if !response.status().is_success() {
        return Err(Error::Config(format!(
            "Download of {} failed: HTTP {}",
            file,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", file, e)))?;

    std::fs::write(path, &bytes)?;
    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_padding() {
        // three tokens of width 2, the last one padding
        let hidden = [1.0, 0.0, 3.0, 0.0, 100.0, 100.0];
        let pooled = mean_pool(&hidden, &[1, 1, 0], 3, 2);
        assert_eq!(pooled, vec![1.0, 0.0]);
    }

    #[test]
    fn test_mean_pool_is_unit_length() {
        let hidden = [3.0, 4.0, 3.0, 4.0];
        let pooled = mean_pool(&hidden, &[1, 1], 2, 2);
        let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((pooled[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_mean_pool_empty_mask_is_zero() {
        let pooled = mean_pool(&[1.0, 2.0], &[0], 1, 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }
}
