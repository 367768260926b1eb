use serde::{Deserialize, Serialize};

use crate::models::domain::RankedMatch;
use crate::models::moderation::{ConversationStage, Guidance, ModerationResult};

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankMatchesResponse {
    pub matches: Vec<RankedMatch>,
    pub total_candidates: usize,
}

/// Per-item outcome of a batch moderation call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BatchItemResult {
    Moderated { result: Box<ModerationResult> },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchModerationResponse {
    pub results: Vec<BatchItemResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Generated,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub text: String,
    pub source: SuggestionSource,
}

/// Moderation verdict on a draft message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftReview {
    pub approved: bool,
    pub escalated: bool,
    pub compliance_score: f64,
    pub guidance: Option<Guidance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSuggestions {
    pub stage: ConversationStage,
    pub suggestions: Vec<Suggestion>,
    pub islamic_guidance: Vec<String>,
    pub cultural_guidance: Vec<String>,
    pub draft_review: Option<DraftReview>,
    pub next_stage: Option<ConversationStage>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
