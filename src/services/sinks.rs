use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{AuditRecord, EscalationTicket, GuardianAlert};

/// Failure delivering to an external sink. Never fails a moderation call.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Write-only destination for moderation decisions
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// External human-review workflow
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    async fn submit(&self, ticket: &EscalationTicket) -> Result<(), SinkError>;
}

/// Channel that reaches the user's wali
#[async_trait]
pub trait GuardianNotifier: Send + Sync {
    async fn notify(&self, user_id: &str, alert: &GuardianAlert) -> Result<(), SinkError>;
}

pub type SharedAuditSink = Arc<dyn AuditSink>;
pub type SharedReviewQueue = Arc<dyn ReviewQueue>;
pub type SharedGuardianNotifier = Arc<dyn GuardianNotifier>;

/// Emits audit records as structured events on the `audit` target
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let record_json = serde_json::to_string(record)?;
        tracing::info!(
            target: "audit",
            audit_id = %record.id,
            user_id = %record.user_id,
            content_type = record.content_type.as_str(),
            approved = record.approved,
            escalated = record.escalated,
            record = %record_json,
            "moderation decision"
        );
        Ok(())
    }
}

/// Logs tickets for a review workflow that tails the service logs
#[derive(Debug, Clone, Default)]
pub struct TracingReviewQueue;

#[async_trait]
impl ReviewQueue for TracingReviewQueue {
    async fn submit(&self, ticket: &EscalationTicket) -> Result<(), SinkError> {
        tracing::warn!(
            target: "review",
            ticket_id = %ticket.id,
            user_id = %ticket.user_id,
            severity = ticket.escalation.severity.as_str(),
            reviewer = ticket.escalation.reviewer_type.as_str(),
            priority = ticket.escalation.priority,
            "escalation ticket created: {}",
            ticket.escalation.reason
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TracingGuardianNotifier;

#[async_trait]
impl GuardianNotifier for TracingGuardianNotifier {
    async fn notify(&self, user_id: &str, alert: &GuardianAlert) -> Result<(), SinkError> {
        if let GuardianAlert::Alert { severity, reasons, .. } = alert {
            tracing::warn!(
                target: "guardian",
                user_id = %user_id,
                severity = severity.as_str(),
                "guardian alert: {}",
                reasons.join("; ")
            );
        }
        Ok(())
    }
}
