use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::models::domain::PracticeLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Message,
    ProfileBio,
    ProfilePrompt,
    PhotoCaption,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Message => "message",
            ContentType::ProfileBio => "profile_bio",
            ContentType::ProfilePrompt => "profile_prompt",
            ContentType::PhotoCaption => "photo_caption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Introduction,
    GettingToKnow,
    FamilyInvolvement,
    MarriageDiscussion,
}

impl ConversationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStage::Introduction => "introduction",
            ConversationStage::GettingToKnow => "getting to know each other",
            ConversationStage::FamilyInvolvement => "family involvement",
            ConversationStage::MarriageDiscussion => "marriage discussion",
        }
    }

    pub fn next(self) -> Option<ConversationStage> {
        match self {
            ConversationStage::Introduction => Some(ConversationStage::GettingToKnow),
            ConversationStage::GettingToKnow => Some(ConversationStage::FamilyInvolvement),
            ConversationStage::FamilyInvolvement => Some(ConversationStage::MarriageDiscussion),
            ConversationStage::MarriageDiscussion => None,
        }
    }
}

/// Cultural context the content is sent in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalContext {
    #[serde(default)]
    pub sender_background: Option<String>,
    #[serde(default)]
    pub recipient_background: Option<String>,
    #[serde(default)]
    pub sender_prayer_frequency: Option<PracticeLevel>,
    #[serde(default)]
    pub conversation_stage: Option<ConversationStage>,
    #[serde(default)]
    pub guardian_supervised: bool,
}

/// One item submitted for moderation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub content_type: ContentType,
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub cultural_context: CulturalContext,
}

impl ModerationRequest {
    pub fn message(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: ContentType::Message,
            user_id: user_id.into(),
            context: None,
            cultural_context: CulturalContext::default(),
        }
    }
}

/// Output of the external safety classifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyClassification {
    pub flagged: bool,
    #[serde(default)]
    pub categories: BTreeMap<String, bool>,
    #[serde(default)]
    pub category_scores: BTreeMap<String, f64>,
}

/// Safety sub-check folded into a score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    pub flagged: bool,
    pub flagged_categories: Vec<String>,
    pub score: f64,
    pub confidence: f64,
    pub degraded: bool,
}

impl SafetyAssessment {
    pub fn fallback() -> Self {
        Self {
            flagged: false,
            flagged_categories: Vec::new(),
            score: 0.7,
            confidence: 0.5,
            degraded: true,
        }
    }
}

/// Named compliance violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    ConcerningLanguage,
    ProhibitedContent,
    InappropriateDating,
    PhysicalReferences,
    AloneMeetings,
    Secrecy,
    ProhibitedSubstances,
}

impl Violation {
    pub fn as_str(self) -> &'static str {
        match self {
            Violation::ConcerningLanguage => "concerning_language",
            Violation::ProhibitedContent => "prohibited_content",
            Violation::InappropriateDating => "inappropriate_dating",
            Violation::PhysicalReferences => "physical_references",
            Violation::AloneMeetings => "alone_meetings",
            Violation::Secrecy => "secrecy",
            Violation::ProhibitedSubstances => "prohibited_substances",
        }
    }
}

/// Revision advice shown to the sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    pub message: String,
    pub revisions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub score: f64,
    pub confidence: f64,
    pub violations: Vec<Violation>,
    pub guidance: Option<Guidance>,
    pub recommendations: Vec<String>,
    pub cultural_notes: Vec<String>,
}

impl ComplianceResult {
    pub fn has_violation(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalSensitivity {
    pub score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub degraded: bool,
}

impl CulturalSensitivity {
    pub fn fallback() -> Self {
        Self {
            score: 0.7,
            confidence: 0.5,
            concerns: Vec::new(),
            suggestions: Vec::new(),
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub language: String,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub appropriateness: f64,
    pub confidence: f64,
    pub escalation_needed: bool,
    pub degraded: bool,
}

impl ContentAnalysis {
    /// Used whenever the analysis call or its payload fails
    pub fn fallback() -> Self {
        Self {
            language: "und".to_string(),
            sentiment: Sentiment::Neutral,
            topics: Vec::new(),
            appropriateness: 0.7,
            confidence: 0.5,
            escalation_needed: true,
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerType {
    Ai,
    Human,
    Scholar,
}

impl ReviewerType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewerType::Ai => "ai",
            ReviewerType::Human => "human",
            ReviewerType::Scholar => "scholar",
        }
    }
}

/// Guardian (wali) notification decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GuardianAlert {
    None,
    #[serde(rename_all = "camelCase")]
    Alert {
        severity: Severity,
        reasons: Vec<String>,
        suggested_actions: Vec<String>,
    },
}

impl GuardianAlert {
    pub fn is_alert(&self) -> bool {
        matches!(self, GuardianAlert::Alert { .. })
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            GuardianAlert::None => None,
            GuardianAlert::Alert { severity, .. } => Some(*severity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationResult {
    pub required: bool,
    pub reason: String,
    pub reasons: Vec<String>,
    pub severity: Severity,
    pub reviewer_type: ReviewerType,
    pub guardian_alert: GuardianAlert,
    pub priority: u8,
    pub estimated_review_minutes: f64,
    pub recommended_action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    InReview,
    Resolved,
    Escalated,
}

/// Review ticket handed to the external human-review workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationTicket {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub content: ModerationRequest,
    pub escalation: EscalationResult,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub approved: bool,
    pub confidence: f64,
    pub appropriateness: f64,
    pub safety: SafetyAssessment,
    pub islamic_compliance: ComplianceResult,
    pub cultural_sensitivity: CulturalSensitivity,
    pub content_analysis: ContentAnalysis,
    pub escalation: EscalationResult,
    pub ticket: Option<EscalationTicket>,
}

impl ModerationResult {
    /// Guidance to show the sender when the content was not auto-approved
    pub fn sender_guidance(&self) -> Option<&Guidance> {
        if self.approved && !self.escalation.required {
            return None;
        }
        self.islamic_compliance.guidance.as_ref()
    }
}

/// Entry written to the audit sink for every moderation decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub content_type: ContentType,
    pub approved: bool,
    pub appropriateness: f64,
    pub safety_score: f64,
    pub compliance_score: f64,
    pub cultural_score: f64,
    pub violations: Vec<Violation>,
    pub escalated: bool,
    pub ticket_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_and_reviewer_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(ReviewerType::Ai < ReviewerType::Human);
        assert!(ReviewerType::Human < ReviewerType::Scholar);
    }

    #[test]
    fn test_guardian_alert_serialization() {
        let alert = GuardianAlert::Alert {
            severity: Severity::High,
            reasons: vec!["private meeting requested".to_string()],
            suggested_actions: vec!["contact the family".to_string()],
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["severity"], "high");

        let none = serde_json::to_value(GuardianAlert::None).unwrap();
        assert_eq!(none["kind"], "none");
    }

    #[test]
    fn test_request_validation() {
        let ok = ModerationRequest::message("u1", "Assalamu alaikum");
        assert!(ok.validate().is_ok());

        let empty = ModerationRequest::message("u1", "");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_fallbacks_are_marked_degraded() {
        assert!(CulturalSensitivity::fallback().degraded);
        assert_eq!(CulturalSensitivity::fallback().score, 0.7);
        let analysis = ContentAnalysis::fallback();
        assert!(analysis.degraded && analysis.escalation_needed);
        assert!(SafetyAssessment::fallback().degraded);
    }
}
