use serde::Deserialize;
use std::sync::Arc;

use crate::core::cultural::{CulturalRules, FamilyInvolvement};
use crate::models::{
    ContentType, ConversationStage, ConversationSuggestions, DraftReview, ModerationRequest, Suggestion,
    SuggestionRequest, SuggestionSource,
};
use crate::moderation::system::ModerationSystem;
use crate::services::providers::{with_timeout, SharedTextGenerator};

pub const MAX_SUGGESTIONS: usize = 3;
const RECENT_MESSAGE_WINDOW: usize = 5;

pub const SUGGESTION_SYSTEM_PROMPT: &str = "You help Muslims on a matrimonial platform keep conversations \
respectful, purposeful and focused on marriage. Suggest short next messages for the sender. \
Respond with a JSON object: {\"suggestions\": [string]}.";

#[derive(Deserialize)]
struct SuggestionPayload {
    suggestions: Vec<String>,
}

/// Deterministic suggestions used when generation fails or is filtered out
pub fn stage_templates(stage: ConversationStage) -> &'static [&'static str] {
    match stage {
        ConversationStage::Introduction => &[
            "Assalamu alaikum, what are you looking for in a spouse?",
            "What role does faith play in your daily life?",
            "Could you tell me a little about your family?",
        ],
        ConversationStage::GettingToKnow => &[
            "What are your goals for the next few years, inshallah?",
            "How do you like to spend your weekends?",
            "What qualities do you value most in a marriage?",
        ],
        ConversationStage::FamilyInvolvement => &[
            "Would you be comfortable with our families speaking soon?",
            "Who in your family should my wali contact?",
            "Shall we arrange a chaperoned meeting with our families present?",
        ],
        ConversationStage::MarriageDiscussion => &[
            "How do you imagine sharing responsibilities after nikah?",
            "Where would you like to live after marriage?",
            "What are your expectations for the mahr and the wedding?",
        ],
    }
}

pub fn islamic_guidance(stage: ConversationStage) -> Vec<String> {
    let guidance: &[&str] = match stage {
        ConversationStage::Introduction => &[
            "Keep the conversation purposeful and focused on marriage",
            "Let your wali or family know about the conversation from the start",
        ],
        ConversationStage::GettingToKnow => &[
            "Ask about deen and character before anything else",
            "Avoid private meetings; keep conversations in supervised settings",
        ],
        ConversationStage::FamilyInvolvement => &[
            "Introduce your families before any meeting",
            "Meet only with a mahram or family member present",
        ],
        ConversationStage::MarriageDiscussion => &[
            "Discuss the mahr and expectations openly with both families",
            "Pray istikhara before making a final decision",
        ],
    };
    guidance.iter().map(|g| g.to_string()).collect()
}

/// Stage-aware suggestions for the next message
pub struct ConversationIntelligence {
    moderation: Arc<ModerationSystem>,
    generator: SharedTextGenerator,
    cultural: Arc<CulturalRules>,
    timeout_secs: u64,
}

impl ConversationIntelligence {
    pub fn new(
        moderation: Arc<ModerationSystem>,
        generator: SharedTextGenerator,
        cultural: Arc<CulturalRules>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            moderation,
            generator,
            cultural,
            timeout_secs,
        }
    }

    pub async fn suggest(&self, request: &SuggestionRequest) -> ConversationSuggestions {
        let draft_review = self.review_draft(request).await;

        let mut suggestions = self.generated_suggestions(request).await;
        if suggestions.is_empty() {
            tracing::debug!("Using template suggestions for {:?}", request.stage);
            suggestions = stage_templates(request.stage)
                .iter()
                .map(|text| Suggestion {
                    text: text.to_string(),
                    source: SuggestionSource::Template,
                })
                .collect();
        }

        ConversationSuggestions {
            stage: request.stage,
            suggestions,
            islamic_guidance: islamic_guidance(request.stage),
            cultural_guidance: self.cultural_guidance(request),
            draft_review,
            next_stage: request.stage.next(),
        }
    }

    async fn review_draft(&self, request: &SuggestionRequest) -> Option<DraftReview> {
        let draft = request.draft.as_deref().filter(|d| !d.trim().is_empty())?;

        let mut cultural_context = request.cultural_context.clone();
        cultural_context.conversation_stage = Some(request.stage);
        let moderation_request = ModerationRequest {
            content: draft.to_string(),
            content_type: ContentType::Message,
            user_id: request.user_id.clone(),
            context: Some(format!("draft during {}", request.stage.as_str())),
            cultural_context,
        };

        match self.moderation.moderate_content(&moderation_request).await {
            Ok(result) => Some(DraftReview {
                approved: result.approved,
                escalated: result.escalation.required,
                compliance_score: result.islamic_compliance.score,
                guidance: result.islamic_compliance.guidance,
            }),
            Err(e) => {
                tracing::warn!("Draft from {} not reviewed: {}", request.user_id, e);
                None
            }
        }
    }

    async fn generated_suggestions(&self, request: &SuggestionRequest) -> Vec<Suggestion> {
        let context = &request.cultural_context;
        let recent = request
            .recent_messages
            .iter()
            .rev()
            .take(RECENT_MESSAGE_WINDOW)
            .rev()
            .map(|m| format!("- {}", m))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Conversation stage: {}\nSender background: {}\nRecipient background: {}\nRecent messages:\n{}\n\nSuggest up to {} next messages.",
            request.stage.as_str(),
            context.sender_background.as_deref().unwrap_or("unknown"),
            context.recipient_background.as_deref().unwrap_or("unknown"),
            if recent.is_empty() { "(none)".to_string() } else { recent },
            MAX_SUGGESTIONS
        );

        let raw = match with_timeout(
            self.timeout_secs,
            self.generator.generate_json(SUGGESTION_SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Suggestion generation failed: {}", e);
                return Vec::new();
            }
        };

        let payload: SuggestionPayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Suggestion response did not match schema: {}", e);
                return Vec::new();
            }
        };

        let checker = self.moderation.compliance_checker();
        payload
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| {
                checker
                    .check_compliance(s, ContentType::Message, context)
                    .violations
                    .is_empty()
            })
            .take(MAX_SUGGESTIONS)
            .map(|text| Suggestion {
                text,
                source: SuggestionSource::Generated,
            })
            .collect()
    }

    fn cultural_guidance(&self, request: &SuggestionRequest) -> Vec<String> {
        let mut guidance = Vec::new();
        let context = &request.cultural_context;

        if let Some(profile) = context
            .recipient_background
            .as_deref()
            .and_then(|b| self.cultural.profile_for(b))
        {
            guidance.push(format!("A customary greeting is \"{}\"", profile.greeting));
            guidance.extend(profile.notes.iter().cloned());

            let early = matches!(
                request.stage,
                ConversationStage::Introduction | ConversationStage::GettingToKnow
            );
            if early && profile.family_involvement == FamilyInvolvement::High && !context.guardian_supervised {
                guidance.push("Consider involving the family soon; it is expected early for this background".to_string());
            }
        }

        if let (Some(sender), Some(recipient)) = (
            context.sender_background.as_deref(),
            context.recipient_background.as_deref(),
        ) {
            if !self.cultural.are_compatible(sender, recipient) {
                guidance.push("Your backgrounds differ; ask about family customs rather than assuming them".to_string());
            }
        }

        guidance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CulturalContext, SafetyClassification};
    use crate::moderation::compliance::IslamicComplianceChecker;
    use crate::moderation::escalation::EscalationSystem;
    use crate::moderation::system::{ModerationSettings, ModerationSinks, CULTURAL_SYSTEM_PROMPT, ANALYSIS_SYSTEM_PROMPT};
    use crate::services::providers::{ProviderError, SafetyClassifier, TextGenerator};
    use async_trait::async_trait;

    struct CleanSafety;

    #[async_trait]
    impl SafetyClassifier for CleanSafety {
        async fn classify(&self, _text: &str) -> Result<SafetyClassification, ProviderError> {
            Ok(SafetyClassification::default())
        }
    }

    struct ScriptedText {
        suggestions: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedText {
        async fn generate(&self, system_prompt: &str, _prompt: &str) -> Result<String, ProviderError> {
            if system_prompt == CULTURAL_SYSTEM_PROMPT {
                return Ok(r#"{"score": 0.9, "confidence": 0.8}"#.to_string());
            }
            if system_prompt == ANALYSIS_SYSTEM_PROMPT {
                return Ok(r#"{"language": "en", "sentiment": "neutral", "appropriateness": 0.9, "confidence": 0.8}"#.to_string());
            }
            self.suggestions
                .clone()
                .ok_or_else(|| ProviderError::InvalidResponse("no suggestions".into()))
        }
    }

    fn intelligence(suggestions: Option<&str>) -> ConversationIntelligence {
        let text: SharedTextGenerator = Arc::new(ScriptedText {
            suggestions: suggestions.map(String::from),
        });
        let moderation = ModerationSystem::new(
            Arc::new(CleanSafety),
            text.clone(),
            Arc::new(IslamicComplianceChecker::with_defaults().unwrap()),
            Arc::new(EscalationSystem::with_defaults().unwrap()),
            ModerationSinks::default(),
            ModerationSettings::default(),
        );
        ConversationIntelligence::new(Arc::new(moderation), text, Arc::new(CulturalRules::default()), 5)
    }

    fn request(stage: ConversationStage, draft: Option<&str>) -> SuggestionRequest {
        SuggestionRequest {
            user_id: "u1".to_string(),
            stage,
            draft: draft.map(String::from),
            recent_messages: vec!["Assalamu alaikum".to_string()],
            cultural_context: CulturalContext {
                sender_background: Some("pakistani".to_string()),
                recipient_background: Some("moroccan".to_string()),
                ..CulturalContext::default()
            },
        }
    }

    #[test]
    fn test_templates_are_compliant() {
        let checker = IslamicComplianceChecker::with_defaults().unwrap();
        for stage in [
            ConversationStage::Introduction,
            ConversationStage::GettingToKnow,
            ConversationStage::FamilyInvolvement,
            ConversationStage::MarriageDiscussion,
        ] {
            for template in stage_templates(stage) {
                let result = checker.check_compliance(template, ContentType::Message, &CulturalContext::default());
                assert!(result.violations.is_empty(), "{}", template);
            }
        }
    }

    #[tokio::test]
    async fn test_generated_suggestions_are_filtered() {
        let engine = intelligence(Some(
            r#"{"suggestions": ["What does your family enjoy doing together?", "Let's meet alone this weekend", "  "]}"#,
        ));
        let result = engine.suggest(&request(ConversationStage::GettingToKnow, None)).await;

        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].source, SuggestionSource::Generated);
        assert_eq!(result.next_stage, Some(ConversationStage::FamilyInvolvement));
    }

    #[tokio::test]
    async fn test_falls_back_to_templates() {
        let engine = intelligence(None);
        let result = engine.suggest(&request(ConversationStage::Introduction, None)).await;

        assert_eq!(result.suggestions.len(), MAX_SUGGESTIONS);
        assert!(result.suggestions.iter().all(|s| s.source == SuggestionSource::Template));
        assert!(!result.islamic_guidance.is_empty());
        assert!(result.draft_review.is_none());
    }

    #[tokio::test]
    async fn test_all_filtered_falls_back_to_templates() {
        let engine = intelligence(Some(r#"{"suggestions": ["Let's meet alone, don't tell anyone"]}"#));
        let result = engine.suggest(&request(ConversationStage::Introduction, None)).await;
        assert!(result.suggestions.iter().all(|s| s.source == SuggestionSource::Template));
    }

    #[tokio::test]
    async fn test_draft_is_reviewed() {
        let engine = intelligence(None);
        let result = engine
            .suggest(&request(ConversationStage::Introduction, Some("Let's meet alone tonight, don't tell anyone")))
            .await;

        let review = result.draft_review.unwrap();
        assert!(!review.approved);
        assert!(review.escalated);
        assert!(review.guidance.is_some());
    }

    #[tokio::test]
    async fn test_cultural_guidance_for_recipient() {
        let engine = intelligence(None);
        let result = engine.suggest(&request(ConversationStage::Introduction, None)).await;
        assert!(result.cultural_guidance.iter().any(|g| g.contains("greeting")));
    }
}
