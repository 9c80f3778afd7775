//! End-to-end document Q&A pipeline
//!
//! Owns one instance of each stage. Ingestion:
//! extract -> chunk -> embed -> index. Questions: retrieve -> synthesize.

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerSynthesizer, PromptBuilder};
use crate::ingestion::{TextChunker, TextExtractor};
use crate::providers::{self, embed_batch, EmbeddingProvider, LlmProvider};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{Answer, Document, FileType, IngestStatus, StatusResponse};

const NO_TEXT_MESSAGE: &str =
    "No text extracted from document. Please upload a text-based PDF or DOCX (not scanned).";

/// Ingestion and question answering over one shared index
pub struct RagPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    embed_concurrency: usize,
    default_top_k: usize,
}

impl RagPipeline {
    /// Build providers from configuration
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder = providers::embedder_from_config(config).await?;
        let llm = providers::llm_from_config(config)?;
        Self::new(config, embedder, llm)
    }

    /// Build with injected providers and a fresh index
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self> {
        let index = Arc::new(VectorIndex::new(embedder.model_id(), embedder.dimensions()));
        Self::with_index(config, embedder, llm, index)
    }

    /// Build over an existing index, which must come from the same embedding model
    pub fn with_index(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Option<Arc<dyn LlmProvider>>,
        index: Arc<VectorIndex>,
    ) -> Result<Self> {
        config.validate()?;

        if index.model_id() != embedder.model_id() || index.dimensions() != embedder.dimensions() {
            return Err(Error::Config(format!(
                "Index was built with '{}' ({} dims) but the embedder is '{}' ({} dims)",
                index.model_id(),
                index.dimensions(),
                embedder.model_id(),
                embedder.dimensions()
            )));
        }

        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&index))
            .with_min_score(config.retrieval.min_score);
        let synthesizer = AnswerSynthesizer::new(
            llm,
            PromptBuilder::new(config.generation.max_context_chars),
        );

        Ok(Self {
            chunker: TextChunker::from_config(&config.chunking)?,
            embedder,
            index,
            retriever,
            synthesizer,
            embed_concurrency: config.embeddings.concurrency,
            default_top_k: config.retrieval.default_top_k,
        })
    }

    /// Extract, chunk, embed and index one document.
    ///
    /// Any failure leaves the index untouched.
    pub async fn ingest(&self, doc: Document) -> Result<IngestStatus> {
        let start = Instant::now();
        let (document_id, filename, file_type) = (doc.id, doc.filename.clone(), doc.file_type);

        tracing::info!(
            "Ingesting '{}' ({}, {} bytes, sha256 {})",
            filename,
            file_type,
            doc.size(),
            &doc.content_hash[..12]
        );

        let extracted = tokio::task::spawn_blocking(move || TextExtractor::extract_document(&doc))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

        if extracted.is_blank() {
            return Err(Error::extraction(&filename, NO_TEXT_MESSAGE));
        }

        if file_type == FileType::Pdf && extracted.empty_units > 0 {
            tracing::warn!(
                "'{}': {} of {} pages have no extractable text (scanned or image-only?)",
                filename,
                extracted.empty_units,
                extracted.units
            );
        }

        let characters = extracted.text.chars().count();
        let chunks = self.chunker.chunk(document_id, &filename, &extracted.text);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let vectors = embed_batch(self.embedder.as_ref(), &texts, self.embed_concurrency).await?;
        let count = self.index.insert_batch(chunks.into_iter().zip(vectors).collect())?;

        let status = IngestStatus {
            document_id,
            filename,
            file_type,
            characters,
            chunks: count,
            sections: extracted.units,
            empty_sections: extracted.empty_units,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Indexed '{}': {} chars, {} chunks in {}ms",
            status.filename,
            status.characters,
            status.chunks,
            status.processing_time_ms
        );

        Ok(status)
    }

    /// Answer a question from the indexed chunks.
    ///
    /// `top_k` defaults to `retrieval.default_top_k`. LLM failures yield a
    /// degraded answer rather than an error.
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyInput("query must not be empty".to_string()));
        }

        let top_k = top_k.unwrap_or(self.default_top_k).max(1);
        let retrieved = self.retriever.retrieve(question, top_k).await?;

        match self.synthesizer.synthesize(question, &retrieved).await {
            Ok(answer) => Ok(answer),
            Err(e @ Error::LlmService(_)) => {
                tracing::warn!("Answer generation failed, returning degraded answer: {}", e);
                Ok(self.synthesizer.degraded(&retrieved))
            }
            Err(e) => Err(e),
        }
    }

    /// Index statistics
    pub fn status(&self) -> StatusResponse {
        let chunks = self.index.len();
        StatusResponse {
            has_index: chunks > 0,
            chunks,
            documents: self.index.document_count(),
            embedding_model: self.embedder.model_id(),
            dimensions: self.embedder.dimensions(),
            llm: self.synthesizer.llm_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::ingestion::parser::tests::build_pdf;
    use crate::providers::HashEmbedder;

    fn offline_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.embeddings.backend = EmbeddingBackend::Hash;
        config
    }

    #[test]
    fn test_rejects_index_from_other_model() {
        let config = RagConfig::default();
        let index = Arc::new(VectorIndex::new("ollama/nomic-embed-text", 384));
        let result =
            RagPipeline::with_index(&config, Arc::new(HashEmbedder::new(384)), None, index);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        let result = RagPipeline::new(&config, Arc::new(HashEmbedder::default()), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_status_of_empty_pipeline() {
        let pipeline = RagPipeline::from_config(&offline_config()).await.unwrap();
        let status = pipeline.status();
        assert!(!status.has_index);
        assert_eq!(status.chunks, 0);
        assert_eq!(status.embedding_model, "hash-v1-384");
        assert_eq!(status.llm, "none");
    }

    #[tokio::test]
    async fn test_blank_question() {
        let pipeline = RagPipeline::from_config(&offline_config()).await.unwrap();
        assert!(matches!(
            pipeline.answer("   ", None).await,
            Err(Error::EmptyInput(_))
        ));
    }

    #[tokio::test]
    async fn test_pdf_pages_without_text_are_reported() {
        let pipeline = RagPipeline::from_config(&offline_config()).await.unwrap();
        let pdf = build_pdf(&["Alpha concept on page one.", "", "Beta concept on page three."]);
        let doc = Document::new("mixed.pdf", FileType::Pdf, pdf);

        let status = pipeline.ingest(doc).await.unwrap();
        assert_eq!(status.sections, 3);
        assert_eq!(status.empty_sections, 1);
        assert!(status.chunks >= 1);
    }
}
