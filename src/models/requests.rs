use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::moderation::{ConversationStage, CulturalContext, ModerationRequest};

/// Request to score one candidate against a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreMatchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "candidate_id", rename = "candidateId")]
    pub candidate_id: String,
}

/// Request to rank a list of candidates for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "candidate_ids", rename = "candidateIds")]
    pub candidate_ids: Vec<String>,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to moderate several items at once
///
/// Only the item count is validated here; each item is checked on its own during moderation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchModerationRequest {
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<ModerationRequest>,
}

/// Request for conversation suggestions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    pub stage: ConversationStage,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub draft: Option<String>,
    #[serde(default)]
    pub recent_messages: Vec<String>,
    #[serde(default)]
    pub cultural_context: CulturalContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_with_empty_item_still_validates() {
        let request = BatchModerationRequest {
            items: vec![ModerationRequest::message("u1", "Assalamu alaikum"), ModerationRequest::message("u1", "")],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_batch_size_limits() {
        let empty = BatchModerationRequest { items: vec![] };
        assert!(empty.validate().is_err());

        let oversized = BatchModerationRequest {
            items: (0..101).map(|i| ModerationRequest::message("u1", format!("message {}", i))).collect(),
        };
        assert!(oversized.validate().is_err());
    }
}
