//! Application state for the HTTP server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::RagPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// The pipeline and its index, alive for the whole process
    pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Create state with providers built from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");
        let pipeline = Arc::new(RagPipeline::from_config(&config).await?);
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an existing pipeline
    pub fn with_pipeline(config: RagConfig, pipeline: Arc<RagPipeline>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.inner.pipeline
    }
}
