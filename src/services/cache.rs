use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::embedding::{EmbeddingGenerationError, EmbeddingGenerator};
use crate::models::{PartnerPreferences, ProfileEmbeddings, UserProfile};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is in-process (moka), L2 is Redis and shared across instances.
/// Without a Redis URL the cache runs L1-only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    pub async fn new(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let redis = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Some(Arc::new(tokio::sync::Mutex::new(manager)))
            }
            None => None,
        };

        Ok(Self {
            redis,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// In-process cache only
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in both tiers
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("DEL").arg(key).query_async::<()>(&mut *conn).await?;
        }
        Ok(())
    }

    /// Cached embeddings for a profile, generating on a miss
    ///
    /// The key carries the model id and the input fingerprint, so a model change or an
    /// edited profile always regenerates instead of serving stale vectors.
    pub async fn get_or_generate_embeddings(
        &self,
        generator: &EmbeddingGenerator,
        profile: &UserProfile,
        preferences: Option<&PartnerPreferences>,
    ) -> Result<ProfileEmbeddings, EmbeddingGenerationError> {
        let fingerprint = generator.fingerprint(profile, preferences);
        let key = CacheKey::embeddings(&profile.user_id, generator.model_id(), &fingerprint);

        match self.get::<ProfileEmbeddings>(&key).await {
            Ok(cached) if cached.model == generator.model_id() && cached.dimensions == generator.dimensions() => {
                return Ok(cached);
            }
            Ok(_) => tracing::debug!("Discarding stale embeddings for {}", profile.user_id),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Embedding cache read failed for {}: {}", profile.user_id, e),
        }

        let embeddings = generator.generate(profile, preferences).await?;
        if let Err(e) = self.set(&key, &embeddings).await {
            tracing::warn!("Embedding cache write failed for {}: {}", profile.user_id, e);
        }

        Ok(embeddings)
    }

    pub fn l1_entry_count(&self) -> u64 {
        self.l1_cache.entry_count()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn embeddings(user_id: &str, model: &str, fingerprint: &str) -> String {
        format!("embeddings:{}:{}:{}", model, user_id, fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, MaritalStatus, PracticeLevel};
    use crate::services::providers::{EmbeddingProvider, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        model: &'static str,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_id(&self) -> &str {
            self.model
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "user_1".to_string(),
            birth_year: 1995,
            gender: Gender::Female,
            location_zone: "uk".to_string(),
            marital_status: MaritalStatus::NeverMarried,
            has_children: false,
            children_count: 0,
            prayer_frequency: PracticeLevel::Always,
            modesty_level: PracticeLevel::Always,
            ethnicity: None,
            languages: vec!["english".to_string()],
            education: None,
            profession: None,
            bio: Some("Teacher who loves reading".to_string()),
            interests: vec!["reading".to_string()],
            personality_traits: vec![],
            wants_children: None,
            religious_knowledge: None,
        }
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get_redis() {
        let cache = CacheManager::new(Some("redis://127.0.0.1:6379"), 1000, 60)
            .await
            .expect("Failed to create cache");

        cache.set("test_key", &"test_value").await.unwrap();
        let result: String = cache.get("test_key").await.unwrap();
        assert_eq!(result, "test_value");

        cache.delete("test_key").await.unwrap();
        assert!(cache.get::<String>("test_key").await.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_set_get_delete() {
        let cache = CacheManager::in_memory(100, 60);
        cache.set("k", &vec![1, 2, 3]).await.unwrap();
        let value: Vec<i32> = cache.get("k").await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);

        cache.delete("k").await.unwrap();
        assert!(matches!(cache.get::<Vec<i32>>("k").await, Err(CacheError::CacheMiss(_))));
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::embeddings("user123", "m1", "abc"), "embeddings:m1:user123:abc");
    }

    #[tokio::test]
    async fn test_embeddings_served_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            model: "m1",
        });
        let generator = EmbeddingGenerator::new(provider.clone());
        let cache = CacheManager::in_memory(100, 60);

        let first = cache.get_or_generate_embeddings(&generator, &profile(), None).await.unwrap();
        let second = cache.get_or_generate_embeddings(&generator, &profile(), None).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.values, second.values);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[tokio::test]
    async fn test_edited_profile_or_new_model_regenerates() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            model: "m1",
        });
        let generator = EmbeddingGenerator::new(provider.clone());
        let cache = CacheManager::in_memory(100, 60);

        cache.get_or_generate_embeddings(&generator, &profile(), None).await.unwrap();

        let mut edited = profile();
        edited.bio = Some("Doctor who loves hiking".to_string());
        cache.get_or_generate_embeddings(&generator, &edited, None).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let upgraded = EmbeddingGenerator::new(Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            model: "m2",
        }));
        let embeddings = cache.get_or_generate_embeddings(&upgraded, &profile(), None).await.unwrap();
        assert_eq!(embeddings.model, "m2");
    }
}
