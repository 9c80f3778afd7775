//! Prompt assembly and answer synthesis

pub mod prompt;
pub mod synthesizer;

pub use prompt::{PromptBuilder, NOT_FOUND_REPLY};
pub use synthesizer::{AnswerSynthesizer, DEGRADED_ANSWER, INSUFFICIENT_CONTEXT_ANSWER, NO_ANSWER};
