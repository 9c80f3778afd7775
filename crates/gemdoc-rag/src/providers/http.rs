//! Shared HTTP plumbing for remote model clients

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Build a pooled client with a request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Retry policy for one remote service
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Hard deadline for one attempt, including body download
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
        }
    }

    /// Run `operation` with the deadline and exponential backoff between attempts.
    ///
    /// `on_timeout` builds the error reported when an attempt exceeds the deadline.
    pub async fn run<F, Fut, T, E>(&self, on_timeout: E, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
        E: Fn(Duration) -> Error,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            let outcome = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(on_timeout(self.timeout)),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal("request was never attempted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy::new(Duration::from_secs(1), 2);

        let result = policy
            .run(
                |_| Error::llm("timeout"),
                move || async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Error::llm("flaky"))
                    } else {
                        Ok(42)
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy::new(Duration::from_secs(1), 0);

        let result: Result<()> = policy
            .run(
                |_| Error::llm("timeout"),
                move || async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(Error::embedding("down"))
                },
            )
            .await;

        assert!(matches!(result, Err(Error::EmbeddingService(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_maps_to_error() {
        let policy = RetryPolicy::new(Duration::from_millis(20), 0);

        let result: Result<()> = policy
            .run(
                |d| Error::llm(format!("timed out after {:?}", d)),
                || async {
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                },
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::LlmService(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
