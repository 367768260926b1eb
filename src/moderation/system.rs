use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::similarity::unit;
use crate::models::{
    AuditRecord, ContentAnalysis, CulturalSensitivity, ModerationRequest, ModerationResult,
    SafetyAssessment, SafetyClassification, Sentiment,
};
use crate::moderation::compliance::IslamicComplianceChecker;
use crate::moderation::escalation::{DegradedChecks, EscalationSystem};
use crate::moderation::ModerationError;
use crate::services::providers::{with_timeout, SharedSafetyClassifier, SharedTextGenerator};
use crate::services::sinks::{
    SharedAuditSink, SharedGuardianNotifier, SharedReviewQueue, TracingAuditSink, TracingGuardianNotifier,
    TracingReviewQueue,
};

pub const MAX_CONTENT_LENGTH: usize = 5000;

/// Safety score ceiling for anything the classifier flagged
pub const FLAGGED_SAFETY_CAP: f64 = 0.3;

pub const CULTURAL_SYSTEM_PROMPT: &str = "You review messages sent between Muslims looking for a spouse. \
Rate how culturally sensitive and respectful the message is for the given backgrounds. \
Respond with a JSON object: {\"score\": number 0-1, \"confidence\": number 0-1, \
\"concerns\": [string], \"suggestions\": [string]}.";

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You analyse content on a Muslim matrimonial platform. \
Respond with a JSON object: {\"language\": ISO 639-1 code, \"sentiment\": \"positive\"|\"neutral\"|\"negative\", \
\"topics\": [string], \"appropriateness\": number 0-1, \"confidence\": number 0-1, \"escalationNeeded\": boolean}.";

/// Fusion weights and approval thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModerationPolicy {
    pub safety_weight: f64,
    pub compliance_weight: f64,
    pub cultural_weight: f64,
    pub content_weight: f64,
    pub reject_below_appropriateness: f64,
    pub reject_below_compliance: f64,
    pub auto_approve_appropriateness: f64,
    pub auto_approve_compliance: f64,
    pub approve_appropriateness: f64,
    pub approve_compliance: f64,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            safety_weight: 0.25,
            compliance_weight: 0.40,
            cultural_weight: 0.20,
            content_weight: 0.15,
            reject_below_appropriateness: 0.3,
            reject_below_compliance: 0.4,
            auto_approve_appropriateness: 0.9,
            auto_approve_compliance: 0.8,
            approve_appropriateness: 0.6,
            approve_compliance: 0.6,
        }
    }
}

impl ModerationPolicy {
    pub fn fusion_total(&self) -> f64 {
        self.safety_weight + self.compliance_weight + self.cultural_weight + self.content_weight
    }

    pub fn appropriateness(&self, safety: f64, compliance: f64, cultural: f64, content: f64) -> f64 {
        unit(
            self.safety_weight * safety
                + self.compliance_weight * compliance
                + self.cultural_weight * cultural
                + self.content_weight * content,
        )
    }

    /// Approval decision; the compliance floor always wins
    pub fn approve(&self, appropriateness: f64, compliance: f64) -> bool {
        if appropriateness < self.reject_below_appropriateness || compliance < self.reject_below_compliance {
            return false;
        }
        if appropriateness >= self.auto_approve_appropriateness && compliance >= self.auto_approve_compliance {
            return true;
        }
        appropriateness >= self.approve_appropriateness && compliance >= self.approve_compliance
    }
}

/// Batching and deadline settings
#[derive(Debug, Clone, Copy)]
pub struct ModerationSettings {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 100,
            timeout_secs: 30,
        }
    }
}

/// External destinations for moderation side effects
#[derive(Clone)]
pub struct ModerationSinks {
    pub audit: SharedAuditSink,
    pub review: SharedReviewQueue,
    pub guardian: SharedGuardianNotifier,
}

impl Default for ModerationSinks {
    fn default() -> Self {
        Self {
            audit: Arc::new(TracingAuditSink),
            review: Arc::new(TracingReviewQueue),
            guardian: Arc::new(TracingGuardianNotifier),
        }
    }
}

/// Fold the classifier output into a score and confidence
pub fn assess_safety(classification: &SafetyClassification) -> SafetyAssessment {
    let max_category = classification
        .category_scores
        .values()
        .copied()
        .map(unit)
        .fold(0.0, f64::max);

    let mut score = unit(1.0 - max_category);
    if classification.flagged {
        score = score.min(FLAGGED_SAFETY_CAP);
    }

    // Certainty in the verdict the classifier actually gave
    let confidence = if classification.flagged { max_category } else { 1.0 - max_category };

    SafetyAssessment {
        flagged: classification.flagged,
        flagged_categories: classification
            .categories
            .iter()
            .filter(|(_, flagged)| **flagged)
            .map(|(name, _)| name.clone())
            .collect(),
        score,
        confidence: unit(confidence).max(0.5),
        degraded: false,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CulturalPayload {
    score: f64,
    confidence: f64,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisPayload {
    language: String,
    sentiment: Sentiment,
    #[serde(default)]
    topics: Vec<String>,
    appropriateness: f64,
    confidence: f64,
    #[serde(default)]
    escalation_needed: bool,
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Strict parse of the cultural sensitivity response
pub fn parse_cultural_sensitivity(raw: &str) -> Option<CulturalSensitivity> {
    let payload: CulturalPayload = serde_json::from_str(raw).ok()?;
    if !in_unit_range(payload.score) || !in_unit_range(payload.confidence) {
        return None;
    }

    Some(CulturalSensitivity {
        score: payload.score,
        confidence: payload.confidence,
        concerns: payload.concerns,
        suggestions: payload.suggestions,
        degraded: false,
    })
}

/// Strict parse of the content analysis response
pub fn parse_content_analysis(raw: &str) -> Option<ContentAnalysis> {
    let payload: AnalysisPayload = serde_json::from_str(raw).ok()?;
    if !in_unit_range(payload.appropriateness) || !in_unit_range(payload.confidence) {
        return None;
    }
    if payload.language.trim().is_empty() {
        return None;
    }

    Some(ContentAnalysis {
        language: payload.language,
        sentiment: payload.sentiment,
        topics: payload.topics,
        appropriateness: payload.appropriateness,
        confidence: payload.confidence,
        escalation_needed: payload.escalation_needed,
        degraded: false,
    })
}

/// Content moderation pipeline
///
/// # Pipeline Stages
/// 1. Local Islamic compliance check
/// 2. Safety, cultural sensitivity and content analysis, concurrently
/// 3. Fusion into appropriateness and the approval decision
/// 4. Escalation, ticketing and guardian alert
/// 5. Audit record, written for every decision
pub struct ModerationSystem {
    safety: SharedSafetyClassifier,
    text: SharedTextGenerator,
    compliance: Arc<IslamicComplianceChecker>,
    escalation: Arc<EscalationSystem>,
    sinks: ModerationSinks,
    policy: ModerationPolicy,
    settings: ModerationSettings,
}

impl ModerationSystem {
    pub fn new(
        safety: SharedSafetyClassifier,
        text: SharedTextGenerator,
        compliance: Arc<IslamicComplianceChecker>,
        escalation: Arc<EscalationSystem>,
        sinks: ModerationSinks,
        settings: ModerationSettings,
    ) -> Self {
        Self {
            safety,
            text,
            compliance,
            escalation,
            sinks,
            policy: ModerationPolicy::default(),
            settings,
        }
    }

    pub fn with_policy(mut self, policy: ModerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ModerationPolicy {
        &self.policy
    }

    pub fn compliance_checker(&self) -> &IslamicComplianceChecker {
        &self.compliance
    }

    pub async fn moderate_content(&self, request: &ModerationRequest) -> Result<ModerationResult, ModerationError> {
        if request.content.trim().is_empty() {
            return Err(ModerationError::EmptyContent);
        }
        let length = request.content.chars().count();
        if length > MAX_CONTENT_LENGTH {
            return Err(ModerationError::ContentTooLong {
                length,
                max: MAX_CONTENT_LENGTH,
            });
        }

        let islamic_compliance =
            self.compliance
                .check_compliance(&request.content, request.content_type, &request.cultural_context);

        let (safety, cultural_sensitivity, content_analysis) = tokio::join!(
            self.check_safety(request),
            self.check_cultural_sensitivity(request),
            self.analyze_content(request)
        );

        let appropriateness = self.policy.appropriateness(
            safety.score,
            islamic_compliance.score,
            cultural_sensitivity.score,
            content_analysis.appropriateness,
        );
        let approved = self.policy.approve(appropriateness, islamic_compliance.score);
        let confidence = unit(
            (safety.confidence
                + islamic_compliance.confidence
                + cultural_sensitivity.confidence
                + content_analysis.confidence)
                / 4.0,
        );

        let escalation = self.escalation.evaluate_escalation(
            request,
            appropriateness,
            &islamic_compliance,
            &cultural_sensitivity,
            DegradedChecks::from_results(&safety, &cultural_sensitivity, &content_analysis),
        );
        let ticket = self.escalation.create_ticket(request, &escalation);

        let result = ModerationResult {
            approved,
            confidence,
            appropriateness,
            safety,
            islamic_compliance,
            cultural_sensitivity,
            content_analysis,
            escalation,
            ticket,
        };

        tracing::debug!(
            "Moderated {} from {}: approved={}, appropriateness={:.2}, escalated={}",
            request.content_type.as_str(),
            request.user_id,
            result.approved,
            result.appropriateness,
            result.escalation.required
        );

        self.emit_side_effects(request, &result).await;

        Ok(result)
    }

    /// Moderate in chunks, pausing between chunks; results keep input order
    pub async fn moderate_batch(
        &self,
        requests: &[ModerationRequest],
    ) -> Vec<Result<ModerationResult, ModerationError>> {
        let mut results = Vec::with_capacity(requests.len());
        let delay = Duration::from_millis(self.settings.batch_delay_ms);

        for (index, chunk) in requests.chunks(self.settings.batch_size.max(1)).enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let chunk_results = join_all(chunk.iter().map(|request| self.moderate_content(request))).await;
            results.extend(chunk_results);
        }

        results
    }

    async fn check_safety(&self, request: &ModerationRequest) -> SafetyAssessment {
        match with_timeout(self.settings.timeout_secs, self.safety.classify(&request.content)).await {
            Ok(classification) => assess_safety(&classification),
            Err(e) => {
                tracing::warn!("Safety classification degraded for {}: {}", request.user_id, e);
                SafetyAssessment::fallback()
            }
        }
    }

    async fn check_cultural_sensitivity(&self, request: &ModerationRequest) -> CulturalSensitivity {
        let context = &request.cultural_context;
        let prompt = format!(
            "Sender background: {}\nRecipient background: {}\nConversation stage: {}\nContent type: {}\n\nContent:\n{}",
            context.sender_background.as_deref().unwrap_or("unknown"),
            context.recipient_background.as_deref().unwrap_or("unknown"),
            context.conversation_stage.map(|s| s.as_str()).unwrap_or("unknown"),
            request.content_type.as_str(),
            request.content
        );

        let raw = with_timeout(
            self.settings.timeout_secs,
            self.text.generate_json(CULTURAL_SYSTEM_PROMPT, &prompt),
        )
        .await;

        match raw {
            Ok(raw) => parse_cultural_sensitivity(&raw).unwrap_or_else(|| {
                tracing::warn!("Cultural sensitivity response for {} did not match schema", request.user_id);
                CulturalSensitivity::fallback()
            }),
            Err(e) => {
                tracing::warn!("Cultural sensitivity check degraded for {}: {}", request.user_id, e);
                CulturalSensitivity::fallback()
            }
        }
    }

    async fn analyze_content(&self, request: &ModerationRequest) -> ContentAnalysis {
        let mut prompt = format!("Content type: {}\n", request.content_type.as_str());
        if let Some(context) = &request.context {
            prompt.push_str(&format!("Context: {}\n", context));
        }
        prompt.push_str(&format!("\nContent:\n{}", request.content));

        let raw = with_timeout(
            self.settings.timeout_secs,
            self.text.generate_json(ANALYSIS_SYSTEM_PROMPT, &prompt),
        )
        .await;

        match raw {
            Ok(raw) => parse_content_analysis(&raw).unwrap_or_else(|| {
                tracing::warn!("Content analysis response for {} did not match schema", request.user_id);
                ContentAnalysis::fallback()
            }),
            Err(e) => {
                tracing::warn!("Content analysis degraded for {}: {}", request.user_id, e);
                ContentAnalysis::fallback()
            }
        }
    }

    async fn emit_side_effects(&self, request: &ModerationRequest, result: &ModerationResult) {
        let record = AuditRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: request.user_id.clone(),
            content_type: request.content_type,
            approved: result.approved,
            appropriateness: result.appropriateness,
            safety_score: result.safety.score,
            compliance_score: result.islamic_compliance.score,
            cultural_score: result.cultural_sensitivity.score,
            violations: result.islamic_compliance.violations.clone(),
            escalated: result.escalation.required,
            ticket_id: result.ticket.as_ref().map(|t| t.id.clone()),
        };

        if let Err(e) = self.sinks.audit.record(&record).await {
            tracing::error!("Failed to write audit record {}: {}", record.id, e);
        }

        if let Some(ticket) = &result.ticket {
            if let Err(e) = self.sinks.review.submit(ticket).await {
                tracing::error!("Failed to submit escalation ticket {}: {}", ticket.id, e);
            }
        }

        if result.escalation.guardian_alert.is_alert() {
            if let Err(e) = self
                .sinks
                .guardian
                .notify(&request.user_id, &result.escalation.guardian_alert)
                .await
            {
                tracing::error!("Failed to notify guardian for {}: {}", request.user_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EscalationTicket, GuardianAlert, Severity, Violation};
    use crate::services::providers::{ProviderError, SafetyClassifier, TextGenerator};
    use crate::services::sinks::{AuditSink, GuardianNotifier, ReviewQueue, SinkError};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct StubSafety(Option<SafetyClassification>);

    #[async_trait]
    impl SafetyClassifier for StubSafety {
        async fn classify(&self, _text: &str) -> Result<SafetyClassification, ProviderError> {
            self.0
                .clone()
                .ok_or_else(|| ProviderError::InvalidResponse("unavailable".into()))
        }
    }

    struct StubText {
        cultural: Option<String>,
        analysis: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for StubText {
        async fn generate(&self, system_prompt: &str, _prompt: &str) -> Result<String, ProviderError> {
            let response = if system_prompt == CULTURAL_SYSTEM_PROMPT {
                &self.cultural
            } else {
                &self.analysis
            };
            response
                .clone()
                .ok_or_else(|| ProviderError::ApiError { status: 503, body: "down".into() })
        }
    }

    #[derive(Default)]
    struct Recorder {
        audits: Mutex<Vec<AuditRecord>>,
        tickets: Mutex<Vec<String>>,
        alerts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuditSink for Recorder {
        async fn record(&self, record: &AuditRecord) -> Result<(), SinkError> {
            self.audits.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl ReviewQueue for Recorder {
        async fn submit(&self, ticket: &EscalationTicket) -> Result<(), SinkError> {
            self.tickets.lock().unwrap().push(ticket.id.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl GuardianNotifier for Recorder {
        async fn notify(&self, user_id: &str, _alert: &GuardianAlert) -> Result<(), SinkError> {
            self.alerts.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
    }

    struct FailingAudit;

    #[async_trait]
    impl AuditSink for FailingAudit {
        async fn record(&self, _record: &AuditRecord) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("disk full".into()))
        }
    }

    fn clean_classification() -> SafetyClassification {
        SafetyClassification {
            flagged: false,
            categories: BTreeMap::new(),
            category_scores: BTreeMap::from([("harassment".to_string(), 0.01)]),
        }
    }

    const GOOD_CULTURAL: &str = r#"{"score": 0.95, "confidence": 0.9, "concerns": [], "suggestions": []}"#;
    const GOOD_ANALYSIS: &str = r#"{"language": "en", "sentiment": "positive", "topics": ["marriage"], "appropriateness": 0.95, "confidence": 0.9, "escalationNeeded": false}"#;

    fn system_with(
        safety: Option<SafetyClassification>,
        cultural: Option<&str>,
        analysis: Option<&str>,
        recorder: Arc<Recorder>,
    ) -> ModerationSystem {
        ModerationSystem::new(
            Arc::new(StubSafety(safety)),
            Arc::new(StubText {
                cultural: cultural.map(String::from),
                analysis: analysis.map(String::from),
            }),
            Arc::new(IslamicComplianceChecker::with_defaults().unwrap()),
            Arc::new(EscalationSystem::with_defaults().unwrap()),
            ModerationSinks {
                audit: recorder.clone(),
                review: recorder.clone(),
                guardian: recorder,
            },
            ModerationSettings {
                batch_size: 2,
                batch_delay_ms: 1,
                timeout_secs: 5,
            },
        )
    }

    fn healthy(recorder: Arc<Recorder>) -> ModerationSystem {
        system_with(Some(clean_classification()), Some(GOOD_CULTURAL), Some(GOOD_ANALYSIS), recorder)
    }

    #[test]
    fn test_fusion_weights_sum_to_one() {
        assert!((ModerationPolicy::default().fusion_total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compliance_floor_always_rejects() {
        let policy = ModerationPolicy::default();
        assert!(!policy.approve(1.0, 0.39));
        assert!(!policy.approve(0.29, 1.0));
        assert!(policy.approve(0.95, 0.85));
        assert!(policy.approve(0.65, 0.65));
        assert!(!policy.approve(0.65, 0.55));
    }

    #[test]
    fn test_assess_safety_flagged_is_capped() {
        let classification = SafetyClassification {
            flagged: true,
            categories: BTreeMap::from([("sexual".to_string(), true), ("violence".to_string(), false)]),
            category_scores: BTreeMap::from([("sexual".to_string(), 0.2)]),
        };
        let assessment = assess_safety(&classification);
        assert_eq!(assessment.score, FLAGGED_SAFETY_CAP);
        assert_eq!(assessment.flagged_categories, vec!["sexual".to_string()]);
    }

    #[test]
    fn test_assess_safety_clean() {
        let assessment = assess_safety(&clean_classification());
        assert!((assessment.score - 0.99).abs() < 1e-9);
        assert!(!assessment.degraded);
    }

    #[test]
    fn test_strict_parsing() {
        assert!(parse_cultural_sensitivity(GOOD_CULTURAL).is_some());
        assert!(parse_cultural_sensitivity("The message seems positive").is_none());
        assert!(parse_cultural_sensitivity(r#"{"score": 1.5, "confidence": 0.9}"#).is_none());

        let analysis = parse_content_analysis(GOOD_ANALYSIS).unwrap();
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert!(parse_content_analysis(r#"{"language": "en", "sentiment": "ecstatic", "appropriateness": 0.9, "confidence": 0.9}"#).is_none());
    }

    #[tokio::test]
    async fn test_compliant_message_approved() {
        let recorder = Arc::new(Recorder::default());
        let system = healthy(recorder.clone());
        let request = ModerationRequest::message(
            "u1",
            "Assalamu alaikum, I would like my family to be involved in getting to know you for marriage",
        );

        let result = system.moderate_content(&request).await.unwrap();

        assert!(result.approved);
        assert!(result.islamic_compliance.violations.is_empty());
        assert!(!result.escalation.required);
        assert!(result.ticket.is_none());
        assert_eq!(recorder.audits.lock().unwrap().len(), 1);
        assert!(recorder.tickets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alone_meeting_rejected_and_alerted() {
        let recorder = Arc::new(Recorder::default());
        let system = healthy(recorder.clone());
        let request = ModerationRequest::message("u1", "Let's meet alone tonight, don't tell anyone");

        let result = system.moderate_content(&request).await.unwrap();

        assert!(!result.approved);
        assert!(result.islamic_compliance.has_violation(Violation::AloneMeetings));
        assert_eq!(result.escalation.guardian_alert.severity(), Some(Severity::High));
        assert!(result.sender_guidance().is_some());
        assert_eq!(recorder.tickets.lock().unwrap().len(), 1);
        assert_eq!(recorder.alerts.lock().unwrap().as_slice(), ["u1".to_string()]);

        let audits = recorder.audits.lock().unwrap();
        assert!(audits[0].escalated);
        assert_eq!(audits[0].ticket_id, result.ticket.as_ref().map(|t| t.id.clone()));
    }

    #[tokio::test]
    async fn test_all_dependencies_down_degrades_and_escalates() {
        let recorder = Arc::new(Recorder::default());
        let system = system_with(None, None, None, recorder.clone());
        let request = ModerationRequest::message(
            "u1",
            "Assalamu alaikum, I would like my family to be involved in getting to know you for marriage",
        );

        let result = system.moderate_content(&request).await.unwrap();

        assert!(result.safety.degraded);
        assert!(result.cultural_sensitivity.degraded);
        assert!(result.content_analysis.degraded);
        assert_eq!(result.content_analysis.language, "und");
        assert!(result.approved);
        assert!(result.escalation.required);
        assert_eq!(recorder.audits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_text_falls_back() {
        let recorder = Arc::new(Recorder::default());
        let system = system_with(
            Some(clean_classification()),
            Some("looks fine to me"),
            Some("positive"),
            recorder,
        );
        let result = system
            .moderate_content(&ModerationRequest::message("u1", "Salam, how is your family?"))
            .await
            .unwrap();

        assert_eq!(result.cultural_sensitivity, CulturalSensitivity::fallback());
        assert_eq!(result.content_analysis, ContentAnalysis::fallback());
    }

    #[tokio::test]
    async fn test_empty_content_fails_fast() {
        let recorder = Arc::new(Recorder::default());
        let system = healthy(recorder.clone());
        let err = system
            .moderate_content(&ModerationRequest::message("u1", "   "))
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::EmptyContent));
        assert!(recorder.audits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_moderation() {
        let recorder = Arc::new(Recorder::default());
        let mut system = healthy(recorder);
        system.sinks.audit = Arc::new(FailingAudit);

        let result = system
            .moderate_content(&ModerationRequest::message("u1", "Assalamu alaikum"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let recorder = Arc::new(Recorder::default());
        let system = healthy(recorder.clone());
        let requests = vec![
            ModerationRequest::message("u1", "Assalamu alaikum, how is your family?"),
            ModerationRequest::message("u2", "Let's meet alone tonight, don't tell anyone"),
            ModerationRequest::message("u3", ""),
            ModerationRequest::message("u4", "Inshallah our parents can talk about nikah"),
            ModerationRequest::message("u5", "zina hookup"),
        ];

        let results = system.moderate_batch(&requests).await;

        assert_eq!(results.len(), 5);
        assert!(results[0].as_ref().unwrap().approved);
        assert!(!results[1].as_ref().unwrap().approved);
        assert!(results[2].is_err());
        assert!(results[3].as_ref().unwrap().approved);
        assert!(!results[4].as_ref().unwrap().approved);
        assert_eq!(recorder.audits.lock().unwrap().len(), 4);
    }
}
