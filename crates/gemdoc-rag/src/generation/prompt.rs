//! Prompt templates for grounded answer generation

use crate::types::response::truncate_chars;
use crate::types::ScoredChunk;

/// Separator between chunks in the context block
const CHUNK_SEPARATOR: &str = "\n\n";

/// Reply the model is told to give when the context lacks the answer
pub const NOT_FOUND_REPLY: &str = "Not found in document.";

/// Builds context blocks and prompts under a character budget
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_context_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_context_chars: usize) -> Self {
        Self {
            max_context_chars: max_context_chars.max(1),
        }
    }

    /// Pick chunks for the prompt in descending-score order.
    ///
    /// Chunks are taken best first until the next one would overflow the
    /// budget; it and everything scoring lower are dropped. When even the best
    /// chunk does not fit it is truncated instead.
    pub fn select_context(&self, retrieved: &[ScoredChunk]) -> Vec<ScoredChunk> {
        let mut ranked: Vec<&ScoredChunk> = retrieved.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let separator_len = CHUNK_SEPARATOR.chars().count();
        let mut used = 0usize;
        let mut selected: Vec<ScoredChunk> = Vec::new();

        for scored in ranked {
            let len = scored.chunk.content.chars().count();
            let cost = if selected.is_empty() { len } else { len + separator_len };

            if used + cost <= self.max_context_chars {
                used += cost;
                selected.push(scored.clone());
                continue;
            }

            if selected.is_empty() {
                let mut truncated = scored.clone();
                truncated.chunk.content = truncated
                    .chunk
                    .content
                    .chars()
                    .take(self.max_context_chars)
                    .collect();
                tracing::debug!(
                    "Truncated chunk {} from {} to {} chars",
                    truncated.chunk.index,
                    len,
                    self.max_context_chars
                );
                selected.push(truncated);
            }
            break;
        }

        if selected.len() < retrieved.len() {
            tracing::debug!(
                "Context budget {} chars: kept {} of {} chunks",
                self.max_context_chars,
                selected.len(),
                retrieved.len()
            );
        }

        selected
    }

    /// Join chunk texts into one context block
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR)
    }

    /// Build the extraction prompt for `question` over `context`
    pub fn build_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are an information extraction assistant.
Rules:
- Use ONLY the information from the context.
- Do NOT copy the entire context.
- Extract ONLY what is explicitly asked in the question.
- If multiple items are asked (like skills, projects), return them as a short comma-separated list.
- If the answer is not in the context, reply: '{not_found}'

Context:
{context}

Question:
{question}

Answer:
"#,
            not_found = NOT_FOUND_REPLY,
            context = context,
            question = question.trim(),
        )
    }

    /// Short preview of a prompt for debug logs
    pub fn preview(prompt: &str) -> String {
        truncate_chars(prompt, 120)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(crate::config::GenerationConfig::default().max_context_chars)
    }
}
