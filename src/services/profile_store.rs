use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{PartnerPreferences, UserProfile};

/// Errors that can occur when reading the profile store
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read-only source of profiles and partner preferences
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileStoreError>;

    /// `None` when the user has not set preferences
    async fn get_preferences(&self, user_id: &str) -> Result<Option<PartnerPreferences>, ProfileStoreError>;

    /// Profiles for many ids; unknown ids are skipped
    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, ProfileStoreError>;
}

pub type SharedProfileStore = Arc<dyn ProfileStore>;

/// Collection IDs in the document store
#[derive(Debug, Clone)]
pub struct ProfileCollections {
    pub profiles: String,
    pub preferences: String,
}

/// REST client for a document database (Appwrite-compatible)
pub struct ProfileStoreClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: ProfileCollections,
}

impl ProfileStoreClient {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: ProfileCollections,
        timeout_secs: u64,
    ) -> Result<Self, ProfileStoreError> {
        let client = Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str, queries: &[String]) -> Result<String, ProfileStoreError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| ProfileStoreError::InvalidResponse(format!("Failed to encode query: {}", e)))?;

        Ok(format!(
            "{}/databases/{}/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection,
            urlencoding::encode(&queries_json)
        ))
    }

    /// Fetch the `documents` array of a collection query
    async fn query_documents(&self, collection: &str, queries: &[String]) -> Result<Vec<Value>, ProfileStoreError> {
        let url = self.documents_url(collection, queries)?;
        tracing::debug!("Querying {} with {} filters", collection, queries.len());

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProfileStoreError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Profile store query on {} failed: {} - {}", collection, status, body);
            return Err(ProfileStoreError::ApiError(format!("Query on {} failed: {}", collection, status)));
        }

        let json: Value = response.json().await?;
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ProfileStoreError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents.clone())
    }

    fn user_query(user_id: &str) -> String {
        format!("equal(\"userId\", {})", Value::String(user_id.to_string()))
    }
}

fn parse_document<T: DeserializeOwned>(doc: &Value, what: &str) -> Result<T, ProfileStoreError> {
    let data = doc.get("data").unwrap_or(doc);
    serde_json::from_value(data.clone())
        .map_err(|e| ProfileStoreError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
}

#[async_trait]
impl ProfileStore for ProfileStoreClient {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileStoreError> {
        let documents = self
            .query_documents(&self.collections.profiles, &[Self::user_query(user_id)])
            .await?;

        let doc = documents
            .first()
            .ok_or_else(|| ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id)))?;

        parse_document(doc, "profile")
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<PartnerPreferences>, ProfileStoreError> {
        let documents = self
            .query_documents(&self.collections.preferences, &[Self::user_query(user_id)])
            .await?;

        documents
            .first()
            .map(|doc| parse_document(doc, "preferences"))
            .transpose()
    }

    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, ProfileStoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = serde_json::to_string(user_ids)
            .map_err(|e| ProfileStoreError::InvalidResponse(format!("Failed to encode ids: {}", e)))?;
        let queries = vec![
            format!("equal(\"userId\", {})", ids),
            format!("limit({})", user_ids.len()),
        ];
        let documents = self.query_documents(&self.collections.profiles, &queries).await?;

        // Malformed documents are skipped rather than failing the whole batch
        let profiles: Vec<UserProfile> = documents
            .iter()
            .filter_map(|doc| match parse_document::<UserProfile>(doc, "profile") {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping profile document: {}", e);
                    None
                }
            })
            .filter(|p| user_ids.contains(&p.user_id))
            .collect();

        tracing::debug!("Fetched {} of {} requested profiles", profiles.len(), user_ids.len());
        Ok(profiles)
    }
}

/// Fixed set of profiles held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: HashMap<String, UserProfile>,
    preferences: HashMap<String, PartnerPreferences>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: UserProfile, preferences: Option<PartnerPreferences>) -> Self {
        if let Some(prefs) = preferences {
            self.preferences.insert(profile.user_id.clone(), prefs);
        }
        self.profiles.insert(profile.user_id.clone(), profile);
        self
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileStoreError> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id)))
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<PartnerPreferences>, ProfileStoreError> {
        Ok(self.preferences.get(user_id).cloned())
    }

    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, ProfileStoreError> {
        Ok(user_ids.iter().filter_map(|id| self.profiles.get(id).cloned()).collect())
    }
}
