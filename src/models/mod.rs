// Model exports
pub mod domain;
pub mod moderation;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeRange, EducationLevel, EmbeddingDimension, ExplanationSource, Gender, MaritalStatus,
    PartnerPreferences, PracticeLevel, ProfileEmbeddings, RankedMatch, ScoreBreakdown,
    SimilarityScore, Subscores, UserProfile,
};
pub use moderation::{
    AuditRecord, ComplianceResult, ContentAnalysis, ContentType, ConversationStage,
    CulturalContext, CulturalSensitivity, EscalationResult, EscalationTicket, GuardianAlert,
    Guidance, ModerationRequest, ModerationResult, ReviewerType, SafetyAssessment,
    SafetyClassification, Sentiment, Severity, TicketStatus, Violation,
};
pub use requests::{BatchModerationRequest, RankMatchesRequest, ScoreMatchRequest, SuggestionRequest};
pub use responses::{
    BatchItemResult, BatchModerationResponse, ConversationSuggestions, DraftReview, ErrorResponse,
    HealthResponse, RankMatchesResponse, Suggestion, SuggestionSource,
};
