// Moderation exports
pub mod compliance;
pub mod conversation;
pub mod escalation;
pub mod system;

use thiserror::Error;

pub use compliance::{default_rules, guidance_for, IslamicComplianceChecker, RuleError, Signal, SignalRule};
pub use conversation::ConversationIntelligence;
pub use escalation::{DegradedChecks, EscalationPolicy, EscalationSystem};
pub use system::{ModerationPolicy, ModerationSettings, ModerationSinks, ModerationSystem};

/// Input errors; dependency failures degrade instead
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Content is empty")]
    EmptyContent,

    #[error("Content is {length} characters, maximum is {max}")]
    ContentTooLong { length: usize, max: usize },
}
