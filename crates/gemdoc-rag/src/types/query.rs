//! Query request types

use serde::{Deserialize, Serialize};

/// Question submitted to `POST /ask`
///
/// Accepted both as JSON and as an urlencoded form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    #[serde(alias = "question")]
    pub query: String,

    /// Number of chunks to retrieve (configured default when absent)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl AskRequest {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Resolve top_k against a default, never below 1
    pub fn top_k_or(&self, default: usize) -> usize {
        self.top_k.unwrap_or(default).max(1)
    }
}
