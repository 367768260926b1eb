//! Nikah Algo - match scoring and content moderation for a Muslim matrimonial platform
//!
//! This library provides the compatibility scoring between member profiles and the
//! moderation pipeline that checks messages against Islamic conduct guidelines.

pub mod config;
pub mod core;
pub mod models;
pub mod moderation;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{cosine_similarity, EmbeddingGenerator, MatchScoringPolicy, SimilarityError, SimilarityMatcher};
pub use models::{
    ModerationRequest, ModerationResult, PartnerPreferences, ProfileEmbeddings, SimilarityScore, UserProfile,
};
pub use moderation::{ConversationIntelligence, EscalationSystem, IslamicComplianceChecker, ModerationSystem};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert!(MatchScoringPolicy::default().unbalanced_groups().is_empty());
    }
}
