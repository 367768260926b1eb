use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::SafetyClassification;
use crate::services::providers::{EmbeddingProvider, ProviderError, SafetyClassifier, TextGenerator};

/// Client for an OpenAI-compatible API
///
/// Serves three roles:
/// - embeddings (`/embeddings`)
/// - safety classification (`/moderations`)
/// - text generation (`/chat/completions`)
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    embedding_dimensions: usize,
    chat_model: String,
    moderation_model: String,
    client: Client,
}

/// Models and endpoint used by the client
#[derive(Debug, Clone)]
pub struct OpenAiModels {
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub chat_model: String,
    pub moderation_model: String,
}

impl Default for OpenAiModels {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            chat_model: "gpt-4o-mini".to_string(),
            moderation_model: "omni-moderation-latest".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct ModerationOutcome {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
    #[serde(default)]
    category_scores: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationOutcome>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        models: OpenAiModels,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            embedding_model: models.embedding_model,
            embedding_dimensions: models.embedding_dimensions,
            chat_model: models.chat_model,
            moderation_model: models.moderation_model,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T>(&self, path: &str, body: serde_json::Value) -> Result<T, ProviderError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Provider call to {} failed with {}", path, status);
            return Err(ProviderError::ApiError { status, body });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", path, e)))
    }

    async fn chat(
        &self,
        system_prompt: &str,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String, ProviderError> {
        let mut body = serde_json::json!({
            "model": &self.chat_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.3
        });

        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response: ChatResponse = self.post_json("chat/completions", body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in chat response".into()))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response: EmbeddingResponse = self
            .post_json(
                "embeddings",
                serde_json::json!({
                    "model": &self.embedding_model,
                    "input": texts,
                    "dimensions": self.embedding_dimensions,
                }),
            )
            .await?;

        // Sort by index to maintain input order
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        tracing::debug!("Embedded {} inputs with {}", data.len(), self.embedding_model);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_id(&self) -> &str {
        &self.embedding_model
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}

#[async_trait]
impl SafetyClassifier for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<SafetyClassification, ProviderError> {
        let response: ModerationResponse = self
            .post_json(
                "moderations",
                serde_json::json!({
                    "model": &self.moderation_model,
                    "input": text,
                }),
            )
            .await?;

        let outcome = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No moderation results".into()))?;

        Ok(SafetyClassification {
            flagged: outcome.flagged,
            categories: outcome.categories,
            category_scores: outcome.category_scores,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError> {
        self.chat(system_prompt, prompt, false).await
    }

    async fn generate_json(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError> {
        self.chat(system_prompt, prompt, true).await
    }
}
