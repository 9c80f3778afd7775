//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use gemdoc_rag::config::RagConfig;
use gemdoc_rag::error::{Error, Result};
use gemdoc_rag::providers::{HashEmbedder, LlmProvider};
use gemdoc_rag::RagPipeline;

pub const SCENARIO_TEXT: &str = "Alpha concept. Beta concept. Gamma concept.";

/// Build a DOCX with one paragraph per entry
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};

    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }
    let mut cursor = std::io::Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

/// Config with small chunks so short fixtures split into several chunks
pub fn small_chunk_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 15;
    config.chunking.chunk_overlap = 5;
    config
}

/// Pipeline with the hashing embedder and an optional scripted LLM
pub fn pipeline(config: &RagConfig, llm: Option<Arc<dyn LlmProvider>>) -> RagPipeline {
    RagPipeline::new(config, Arc::new(HashEmbedder::default()), llm).unwrap()
}

/// LLM fake that returns a fixed reply (or failure) and records prompts
pub struct ScriptedLlm {
    reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone().map_err(Error::LlmService)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "fixture"
    }
}
