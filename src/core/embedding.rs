use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{EmbeddingDimension, PartnerPreferences, ProfileEmbeddings, UserProfile};
use crate::services::providers::SharedEmbeddingProvider;

const EMPTY_BUCKET: &str = "not specified";

/// Embedding failed for a profile. There is no safe default vector.
#[derive(Debug, Error)]
#[error("Embedding generation failed for profile {profile_id}: {reason}")]
pub struct EmbeddingGenerationError {
    pub profile_id: String,
    pub reason: String,
}

/// Text submitted for each of the five semantic buckets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingInputs {
    pub values: String,
    pub interests: String,
    pub lifestyle: String,
    pub personality: String,
    pub profile_text: String,
}

impl EmbeddingInputs {
    /// Group profile fields into buckets
    pub fn from_profile(profile: &UserProfile, preferences: Option<&PartnerPreferences>) -> Self {
        let mut values = vec![
            format!("prays {}", profile.prayer_frequency.as_str()),
            format!("practises modesty {}", profile.modesty_level.as_str()),
            format!("marital status: {}", profile.marital_status.as_str()),
        ];
        if profile.with_children() {
            values.push(format!("has {} children", profile.children_count.max(1)));
        }
        match profile.wants_children {
            Some(true) => values.push("wants children".to_string()),
            Some(false) => values.push("does not want children".to_string()),
            None => {}
        }
        if let Some(knowledge) = profile.religious_knowledge {
            values.push(format!("studies the deen {}", knowledge.as_str()));
        }
        if let Some(prefs) = preferences {
            if let Some(range) = prefs.age_range {
                values.push(format!("seeking a spouse aged {} to {}", range.min, range.max));
            }
            if !prefs.children_accepted() {
                values.push("prefers a spouse without children".to_string());
            }
        }

        let mut lifestyle = vec![
            format!("modesty {}", profile.modesty_level.as_str()),
            format!("prayer {}", profile.prayer_frequency.as_str()),
            format!("lives in {}", profile.location_zone),
        ];
        if let Some(profession) = &profile.profession {
            lifestyle.push(format!("works as {}", profession));
        }
        if let Some(education) = profile.education {
            lifestyle.push(format!("education: {}", education.as_str()));
        }
        if !profile.languages.is_empty() {
            lifestyle.push(format!("speaks {}", profile.languages.join(", ")));
        }

        let mut personality = profile.personality_traits.clone();
        if let Some(bio) = &profile.bio {
            personality.push(bio.clone());
        }

        Self {
            values: bucket(values.join("; ")),
            interests: bucket(profile.interests.join(", ")),
            lifestyle: bucket(lifestyle.join("; ")),
            personality: bucket(personality.join(". ")),
            profile_text: bucket(profile.bio.clone().unwrap_or_default()),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        EmbeddingDimension::ALL
            .iter()
            .map(|d| self.text(*d).to_string())
            .collect()
    }

    pub fn text(&self, dimension: EmbeddingDimension) -> &str {
        match dimension {
            EmbeddingDimension::Values => &self.values,
            EmbeddingDimension::Interests => &self.interests,
            EmbeddingDimension::Lifestyle => &self.lifestyle,
            EmbeddingDimension::Personality => &self.personality,
            EmbeddingDimension::ProfileText => &self.profile_text,
        }
    }

    /// SHA-256 over the model and bucket texts, each length-prefixed; changes whenever regeneration is needed
    ///
    /// The value is persisted in cache keys, so it must not depend on the toolchain.
    pub fn fingerprint(&self, model: &str) -> String {
        let mut hasher = Sha256::new();
        let parts = std::iter::once(model).chain(EmbeddingDimension::ALL.iter().map(|d| self.text(*d)));
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.finalize()[..16].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn bucket(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_BUCKET.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turns profiles into five semantic vectors via the embedding provider
#[derive(Clone)]
pub struct EmbeddingGenerator {
    provider: SharedEmbeddingProvider,
}

impl EmbeddingGenerator {
    pub fn new(provider: SharedEmbeddingProvider) -> Self {
        Self { provider }
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Fingerprint the profile would get without calling the provider
    pub fn fingerprint(&self, profile: &UserProfile, preferences: Option<&PartnerPreferences>) -> String {
        EmbeddingInputs::from_profile(profile, preferences).fingerprint(self.model_id())
    }

    pub async fn generate(
        &self,
        profile: &UserProfile,
        preferences: Option<&PartnerPreferences>,
    ) -> Result<ProfileEmbeddings, EmbeddingGenerationError> {
        let inputs = EmbeddingInputs::from_profile(profile, preferences);
        let model = self.provider.model_id().to_string();
        let dimensions = self.provider.dimensions();

        let fail = |reason: String| EmbeddingGenerationError {
            profile_id: profile.user_id.clone(),
            reason,
        };

        let vectors = self
            .provider
            .embed_batch(&inputs.texts())
            .await
            .map_err(|e| fail(e.to_string()))?;

        if vectors.len() != EmbeddingDimension::ALL.len() {
            return Err(fail(format!(
                "expected {} vectors, provider returned {}",
                EmbeddingDimension::ALL.len(),
                vectors.len()
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(fail(format!(
                "vector length {} does not match model dimensionality {}",
                bad.len(),
                dimensions
            )));
        }

        let mut vectors = vectors.into_iter();
        let mut next = || vectors.next().unwrap_or_default();

        let embeddings = ProfileEmbeddings {
            profile_id: profile.user_id.clone(),
            values: next(),
            interests: next(),
            lifestyle: next(),
            personality: next(),
            profile_text: next(),
            fingerprint: inputs.fingerprint(&model),
            model,
            dimensions,
            generated_at: Utc::now(),
        };

        tracing::debug!(
            "Generated embeddings for {} ({} x {})",
            embeddings.profile_id,
            EmbeddingDimension::ALL.len(),
            embeddings.dimensions
        );

        Ok(embeddings)
    }
}
