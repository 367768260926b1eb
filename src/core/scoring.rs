use serde::{Deserialize, Serialize};

use crate::core::islamic::IslamicWeights;
use crate::core::similarity::unit;
use crate::models::{EmbeddingDimension, Subscores};

/// Per-dimension embedding weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingWeights {
    pub values: f64,
    pub personality: f64,
    pub lifestyle: f64,
    pub interests: f64,
    pub profile_text: f64,
}

impl Default for EmbeddingWeights {
    fn default() -> Self {
        Self {
            values: 0.35,
            personality: 0.20,
            lifestyle: 0.20,
            interests: 0.15,
            profile_text: 0.10,
        }
    }
}

impl EmbeddingWeights {
    pub fn weight(&self, dimension: EmbeddingDimension) -> f64 {
        match dimension {
            EmbeddingDimension::Values => self.values,
            EmbeddingDimension::Interests => self.interests,
            EmbeddingDimension::Lifestyle => self.lifestyle,
            EmbeddingDimension::Personality => self.personality,
            EmbeddingDimension::ProfileText => self.profile_text,
        }
    }

    pub fn total(&self) -> f64 {
        EmbeddingDimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }
}

/// Weights of the rule-based half of the blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWeights {
    pub demographics: f64,
    pub islamic_alignment: f64,
    pub cultural_compatibility: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            demographics: 0.2,
            islamic_alignment: 0.5,
            cultural_compatibility: 0.3,
        }
    }
}

impl RuleWeights {
    pub fn total(&self) -> f64 {
        self.demographics + self.islamic_alignment + self.cultural_compatibility
    }
}

/// Every weight used by the similarity matcher, in one place
///
/// overall = embedding_share × Σ(embedding weight × subscore)
///         + rule_share × (demographics, islamic, cultural blend)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScoringPolicy {
    pub embedding_share: f64,
    pub rule_share: f64,
    pub embeddings: EmbeddingWeights,
    pub rules: RuleWeights,
    pub islamic: IslamicWeights,
}

impl Default for MatchScoringPolicy {
    fn default() -> Self {
        Self {
            embedding_share: 0.6,
            rule_share: 0.4,
            embeddings: EmbeddingWeights::default(),
            rules: RuleWeights::default(),
            islamic: IslamicWeights::default(),
        }
    }
}

impl MatchScoringPolicy {
    /// Weight groups that do not sum to 1.0, by name
    pub fn unbalanced_groups(&self) -> Vec<&'static str> {
        let groups = [
            ("blend", self.embedding_share + self.rule_share),
            ("embeddings", self.embeddings.total()),
            ("rules", self.rules.total()),
            ("islamic", self.islamic.total()),
        ];

        groups
            .iter()
            .filter(|(_, total)| (total - 1.0).abs() > 1e-9)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Weighted embedding similarity over the five dimensions
    pub fn embedding_similarity(&self, subscores: &Subscores) -> f64 {
        EmbeddingDimension::ALL
            .iter()
            .map(|d| self.embeddings.weight(*d) * subscores.embedding(*d))
            .sum()
    }

    /// Blend embedding and rule-based signals into the overall score, clamped to [0,1]
    pub fn overall(&self, subscores: &Subscores, islamic_alignment: f64, cultural_compatibility: f64) -> f64 {
        let rules = self.rules.demographics * subscores.demographics
            + self.rules.islamic_alignment * islamic_alignment
            + self.rules.cultural_compatibility * cultural_compatibility;

        unit(self.embedding_share * self.embedding_similarity(subscores) + self.rule_share * rules)
    }
}
