use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::SafetyClassification;

/// Errors raised by external model providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Provider returned error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Provider call timed out after {0}s")]
    Timeout(u64),
}

/// Text in, fixed-dimension vectors out
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed several inputs in one call, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Model identifier used to detect stale vectors
    fn model_id(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimensions(&self) -> usize;
}

/// General content safety classifier
#[async_trait]
pub trait SafetyClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SafetyClassification, ProviderError>;
}

/// Prompt in, free text out. Callers must have a fallback.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Same as `generate` but asks the provider for a JSON object
    async fn generate_json(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError> {
        self.generate(system_prompt, prompt).await
    }
}

pub type SharedEmbeddingProvider = Arc<dyn EmbeddingProvider>;
pub type SharedSafetyClassifier = Arc<dyn SafetyClassifier>;
pub type SharedTextGenerator = Arc<dyn TextGenerator>;

/// Run a provider call under a per-call deadline
pub async fn with_timeout<T, F>(timeout_secs: u64, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(1, async { Ok::<_, ProviderError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed_deadline() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, ProviderError>(())
        };

        assert!(matches!(with_timeout(1, slow).await, Err(ProviderError::Timeout(1))));
    }
}
