use chrono::{Datelike, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::core::{
    cultural::CulturalRules,
    demographics::{demographic_score, DemographicRules},
    islamic::islamic_factors,
    scoring::MatchScoringPolicy,
    similarity::{similarity_score, unit},
};
use crate::models::{
    EmbeddingDimension, ExplanationSource, PartnerPreferences, ProfileEmbeddings, RankedMatch,
    ScoreBreakdown, SimilarityScore, Subscores, UserProfile,
};
use crate::services::providers::SharedTextGenerator;

/// Errors comparing two embedding sets
#[derive(Debug, Error, PartialEq)]
pub enum SimilarityError {
    #[error("Embeddings for {profile_a} ({model_a}) and {profile_b} ({model_b}) come from different models")]
    ModelMismatch {
        profile_a: String,
        profile_b: String,
        model_a: String,
        model_b: String,
    },

    #[error("Embedding dimensionality mismatch between {profile_a} ({dims_a}) and {profile_b} ({dims_b}) on {dimension:?}")]
    DimensionMismatch {
        profile_a: String,
        profile_b: String,
        dimension: EmbeddingDimension,
        dims_a: usize,
        dims_b: usize,
    },
}

/// One scored side of a comparison
pub struct MatchSide<'a> {
    pub profile: &'a UserProfile,
    pub preferences: &'a PartnerPreferences,
    pub embeddings: &'a ProfileEmbeddings,
}

const EXPLANATION_SYSTEM_PROMPT: &str = "You explain matrimonial compatibility to Muslim members. \
Write two or three warm, modest sentences. Never mention physical attraction. \
Base every statement on the scores provided.";

/// Computes compatibility between two members
///
/// # Pipeline Stages
/// 1. Cosine similarity per embedding dimension
/// 2. Demographic compatibility
/// 3. Islamic compatibility
/// 4. Cultural compatibility
/// 5. Weighted blend
/// 6. Explanation (generated, with template fallback)
#[derive(Clone)]
pub struct SimilarityMatcher {
    policy: MatchScoringPolicy,
    demographics: DemographicRules,
    cultural: CulturalRules,
    explainer: Option<SharedTextGenerator>,
}

impl SimilarityMatcher {
    pub fn new(
        policy: MatchScoringPolicy,
        demographics: DemographicRules,
        cultural: CulturalRules,
        explainer: Option<SharedTextGenerator>,
    ) -> Self {
        Self {
            policy,
            demographics,
            cultural,
            explainer,
        }
    }

    /// Matcher with built-in rules and no explanation provider
    pub fn with_defaults() -> Self {
        Self::new(
            MatchScoringPolicy::default(),
            DemographicRules::default(),
            CulturalRules::default(),
            None,
        )
    }

    pub fn policy(&self) -> &MatchScoringPolicy {
        &self.policy
    }

    /// Deterministic score for a pair, evaluated against `reference_year`
    pub fn score(
        &self,
        a: &MatchSide<'_>,
        b: &MatchSide<'_>,
        reference_year: i32,
    ) -> Result<ScoreBreakdown, SimilarityError> {
        let (ea, eb) = (a.embeddings, b.embeddings);

        if ea.model != eb.model {
            return Err(SimilarityError::ModelMismatch {
                profile_a: a.profile.user_id.clone(),
                profile_b: b.profile.user_id.clone(),
                model_a: ea.model.clone(),
                model_b: eb.model.clone(),
            });
        }

        let embedding = |dimension: EmbeddingDimension| -> Result<f64, SimilarityError> {
            let (va, vb) = (ea.vector(dimension), eb.vector(dimension));
            similarity_score(va, vb).ok_or_else(|| SimilarityError::DimensionMismatch {
                profile_a: a.profile.user_id.clone(),
                profile_b: b.profile.user_id.clone(),
                dimension,
                dims_a: va.len(),
                dims_b: vb.len(),
            })
        };

        let subscores = Subscores {
            values: embedding(EmbeddingDimension::Values)?,
            interests: embedding(EmbeddingDimension::Interests)?,
            lifestyle: embedding(EmbeddingDimension::Lifestyle)?,
            personality: embedding(EmbeddingDimension::Personality)?,
            profile_text: embedding(EmbeddingDimension::ProfileText)?,
            demographics: unit(demographic_score(
                &self.demographics,
                a.profile,
                b.profile,
                a.preferences,
                b.preferences,
                reference_year,
            )),
        };

        let islamic_alignment = unit(self.policy.islamic.score(&islamic_factors(a.profile, b.profile)));
        let cultural_compatibility = unit(self.cultural.cultural_score(a.profile, b.profile));

        Ok(ScoreBreakdown {
            overall: self.policy.overall(&subscores, islamic_alignment, cultural_compatibility),
            subscores,
            islamic_alignment,
            cultural_compatibility,
        })
    }

    /// Full evaluation including the natural-language explanation
    pub async fn calculate_similarity(
        &self,
        embeddings_a: &ProfileEmbeddings,
        embeddings_b: &ProfileEmbeddings,
        profile_a: &UserProfile,
        profile_b: &UserProfile,
        prefs_a: &PartnerPreferences,
        prefs_b: &PartnerPreferences,
    ) -> Result<SimilarityScore, SimilarityError> {
        let a = MatchSide {
            profile: profile_a,
            preferences: prefs_a,
            embeddings: embeddings_a,
        };
        let b = MatchSide {
            profile: profile_b,
            preferences: prefs_b,
            embeddings: embeddings_b,
        };

        let breakdown = self.score(&a, &b, Utc::now().year())?;
        let (explanation, explanation_source) = self.explain(&breakdown, profile_a, profile_b).await;

        tracing::debug!(
            "Scored {} vs {}: overall {:.3}",
            profile_a.user_id,
            profile_b.user_id,
            breakdown.overall
        );

        Ok(SimilarityScore {
            overall: breakdown.overall,
            subscores: breakdown.subscores,
            islamic_alignment: breakdown.islamic_alignment,
            cultural_compatibility: breakdown.cultural_compatibility,
            explanation,
            explanation_source,
        })
    }

    /// Score every candidate and return the best `limit`, highest first
    ///
    /// Candidates whose embeddings cannot be compared are skipped.
    pub fn rank(&self, user: &MatchSide<'_>, candidates: &[MatchSide<'_>], limit: usize) -> Vec<RankedMatch> {
        let year = Utc::now().year();

        let mut ranked: Vec<RankedMatch> = candidates
            .iter()
            .filter(|candidate| candidate.profile.user_id != user.profile.user_id)
            .filter_map(|candidate| match self.score(user, candidate, year) {
                Ok(score) => Some(RankedMatch {
                    user_id: candidate.profile.user_id.clone(),
                    score,
                    explanation: None,
                }),
                Err(e) => {
                    tracing::warn!("Skipping candidate: {}", e);
                    None
                }
            })
            .collect();

        // Sort by score (descending) and then by user id for a stable order
        ranked.sort_by(|a, b| {
            b.score
                .overall
                .partial_cmp(&a.score.overall)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        ranked.truncate(limit);
        ranked
    }

    /// Attach an explanation to each ranked match, keeping the ranking order
    ///
    /// At most `concurrency` explanations are generated at once. Matches whose
    /// candidate is not in `candidates` get the template text.
    pub async fn explain_ranked(
        &self,
        user: &UserProfile,
        candidates: &[MatchSide<'_>],
        ranked: Vec<RankedMatch>,
        concurrency: usize,
    ) -> Vec<RankedMatch> {
        stream::iter(ranked)
            .map(|mut ranked_match| async move {
                let candidate = candidates
                    .iter()
                    .find(|side| side.profile.user_id == ranked_match.user_id);
                let text = match candidate {
                    Some(side) => self.explain(&ranked_match.score, user, side.profile).await.0,
                    None => template_explanation(&ranked_match.score),
                };
                ranked_match.explanation = Some(text);
                ranked_match
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Explanation text, falling back to a template on any provider failure
    pub async fn explain(
        &self,
        breakdown: &ScoreBreakdown,
        profile_a: &UserProfile,
        profile_b: &UserProfile,
    ) -> (String, ExplanationSource) {
        let Some(explainer) = &self.explainer else {
            return (template_explanation(breakdown), ExplanationSource::Template);
        };

        let prompt = explanation_prompt(breakdown, profile_a, profile_b);
        match explainer.generate(EXPLANATION_SYSTEM_PROMPT, &prompt).await {
            Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), ExplanationSource::Generated),
            Ok(_) => (template_explanation(breakdown), ExplanationSource::Template),
            Err(e) => {
                tracing::warn!("Explanation generation failed, using template: {}", e);
                (template_explanation(breakdown), ExplanationSource::Template)
            }
        }
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn percent(score: f64) -> u32 {
    (unit(score) * 100.0).round() as u32
}

fn explanation_prompt(breakdown: &ScoreBreakdown, profile_a: &UserProfile, profile_b: &UserProfile) -> String {
    let subscores = breakdown
        .subscores
        .labelled()
        .iter()
        .map(|(label, score)| format!("- {}: {}%", label, percent(*score)))
        .collect::<Vec<_>>()
        .join("\n");

    let shared_languages: Vec<&String> = profile_a
        .languages
        .iter()
        .filter(|l| profile_b.languages.iter().any(|m| m.eq_ignore_ascii_case(l)))
        .collect();

    format!(
        "Overall compatibility: {}%\nIslamic alignment: {}%\nCultural compatibility: {}%\n{}\n\
         Highlights: both pray {} / {}; shared languages: {}",
        percent(breakdown.overall),
        percent(breakdown.islamic_alignment),
        percent(breakdown.cultural_compatibility),
        subscores,
        profile_a.prayer_frequency.as_str(),
        profile_b.prayer_frequency.as_str(),
        if shared_languages.is_empty() {
            "none".to_string()
        } else {
            shared_languages.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
        }
    )
}

/// Deterministic explanation naming the strongest dimension
pub fn template_explanation(breakdown: &ScoreBreakdown) -> String {
    let (label, score) = breakdown
        .subscores
        .labelled()
        .into_iter()
        .fold(("", f64::MIN), |best, current| if current.1 > best.1 { current } else { best });

    format!(
        "You are {}% compatible overall. Your strongest alignment is in {} ({}%), \
         with {}% Islamic alignment.",
        percent(breakdown.overall),
        label,
        percent(score),
        percent(breakdown.islamic_alignment)
    )
}
