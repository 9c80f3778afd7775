//! Answer synthesis over retrieved chunks

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{Answer, AnswerKind, RetrievalResult};

use super::prompt::PromptBuilder;

/// Returned without an LLM call when retrieval found nothing usable
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I could not find relevant information in the uploaded document to answer this question.";

/// Returned when the LLM call fails
pub const DEGRADED_ANSWER: &str = "Unable to generate an answer right now. Please try again later.";

/// Returned when the LLM replies with nothing
pub const NO_ANSWER: &str = "No answer found.";

/// Turns a question plus retrieved chunks into an answer
pub struct AnswerSynthesizer {
    llm: Option<Arc<dyn LlmProvider>>,
    prompts: PromptBuilder,
}

impl AnswerSynthesizer {
    /// Create a synthesizer; without an LLM answers are the retrieved context
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, prompts: PromptBuilder) -> Self {
        Self { llm, prompts }
    }

    /// Name of the configured LLM, or "none"
    pub fn llm_name(&self) -> String {
        match &self.llm {
            Some(llm) => format!("{}/{}", llm.name(), llm.model()),
            None => "none".to_string(),
        }
    }

    /// Answer `question` from `retrieved`.
    ///
    /// Fails only when the LLM call fails (`Error::LlmService`).
    pub async fn synthesize(&self, question: &str, retrieved: &RetrievalResult) -> Result<Answer> {
        if retrieved.is_empty() {
            return Ok(Answer {
                text: INSUFFICIENT_CONTEXT_ANSWER.to_string(),
                kind: AnswerKind::InsufficientContext,
                context: Vec::new(),
            });
        }

        let context = self.prompts.select_context(&retrieved.results);
        let context_text = PromptBuilder::build_context(&context);

        let Some(llm) = &self.llm else {
            return Ok(Answer {
                text: context_text,
                kind: AnswerKind::ContextOnly,
                context,
            });
        };

        let prompt = PromptBuilder::build_prompt(question, &context_text);
        tracing::debug!(
            "Prompt ({} chars, {} chunks): {}",
            prompt.chars().count(),
            context.len(),
            PromptBuilder::preview(&prompt)
        );

        let output = llm.generate(&prompt).await?;
        let text = match output.trim() {
            "" => NO_ANSWER.to_string(),
            trimmed => trimmed.to_string(),
        };

        Ok(Answer {
            text,
            kind: AnswerKind::Generated,
            context,
        })
    }

    /// Fallback answer after an LLM failure, still attributing the retrieved context
    pub fn degraded(&self, retrieved: &RetrievalResult) -> Answer {
        Answer {
            text: DEGRADED_ANSWER.to_string(),
            kind: AnswerKind::Degraded,
            context: self.prompts.select_context(&retrieved.results),
        }
    }
}
