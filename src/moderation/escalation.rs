use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;

use crate::models::{
    ComplianceResult, ContentAnalysis, CulturalSensitivity, EscalationResult, EscalationTicket,
    GuardianAlert, ModerationRequest, ReviewerType, SafetyAssessment, Severity, TicketStatus, Violation,
};

/// Terms whose rulings need a scholar rather than a general reviewer
pub const COMPLEX_JURISPRUDENCE_TERMS: &[&str] = &[
    "fatwa", "sharia", "shariah", "fiqh", "polygamy", "polygyny", "second wife", "co-wife",
    "divorce", "talaq", "khula", "iddah", "inheritance", "halala", "mut'ah", "mutah",
    "temporary marriage", "misyar", "madhab", "madhhab", "sunni", "shia", "salafi", "sufi",
    "ahmadi", "takfir",
];

/// Escalation thresholds
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    pub appropriateness_floor: f64,
    pub compliance_floor: f64,
    pub max_violations: usize,
    pub cultural_floor: f64,
    pub guardian_compliance_floor: f64,
    pub guardian_appropriateness_floor: f64,
    pub guardian_cultural_floor: f64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            appropriateness_floor: 0.6,
            compliance_floor: 0.7,
            max_violations: 3,
            cultural_floor: 0.7,
            guardian_compliance_floor: 0.5,
            guardian_appropriateness_floor: 0.4,
            guardian_cultural_floor: 0.5,
        }
    }
}

/// Health of the two sub-checks that can degrade independently of the scores
#[derive(Debug, Clone, Copy, Default)]
pub struct DegradedChecks {
    pub safety: bool,
    pub cultural: bool,
    pub analysis: bool,
    pub analysis_requests_review: bool,
}

impl DegradedChecks {
    pub fn from_results(
        safety: &SafetyAssessment,
        cultural: &CulturalSensitivity,
        analysis: &ContentAnalysis,
    ) -> Self {
        Self {
            safety: safety.degraded,
            cultural: cultural.degraded,
            analysis: analysis.degraded,
            analysis_requests_review: analysis.escalation_needed,
        }
    }

    fn any(&self) -> bool {
        self.safety || self.cultural || self.analysis || self.analysis_requests_review
    }
}

pub fn severity_base(severity: Severity) -> u32 {
    match severity {
        Severity::High => 30,
        Severity::Medium => 20,
        Severity::Low => 10,
    }
}

pub fn reviewer_bonus(reviewer: ReviewerType) -> u32 {
    match reviewer {
        ReviewerType::Scholar => 15,
        ReviewerType::Human => 10,
        ReviewerType::Ai => 5,
    }
}

pub fn guardian_bonus(alert: &GuardianAlert) -> u32 {
    match alert.severity() {
        Some(Severity::High) => 20,
        Some(Severity::Medium) => 10,
        Some(Severity::Low) => 5,
        None => 0,
    }
}

/// Priority in [0,100]
pub fn priority(severity: Severity, reviewer: ReviewerType, alert: &GuardianAlert) -> u8 {
    (severity_base(severity) + reviewer_bonus(reviewer) + guardian_bonus(alert)).min(100) as u8
}

/// Minutes a reviewer is expected to spend
pub fn estimated_review_minutes(severity: Severity, reviewer: ReviewerType) -> f64 {
    let base = match reviewer {
        ReviewerType::Ai => 1.0,
        ReviewerType::Human => 15.0,
        ReviewerType::Scholar => 60.0,
    };
    let multiplier = match severity {
        Severity::Low => 1.0,
        Severity::Medium => 1.5,
        Severity::High => 2.0,
    };
    base * multiplier
}

/// `ESC-<unix millis>-<9 random alphanumerics>`
pub fn generate_ticket_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("ESC-{}-{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

/// Decides whether content needs a human or scholar
pub struct EscalationSystem {
    policy: EscalationPolicy,
    complex_terms: Regex,
}

impl EscalationSystem {
    pub fn new(policy: EscalationPolicy, complex_terms: &[&str]) -> Result<Self, regex::Error> {
        let alternatives = complex_terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let complex_terms = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives))?;
        Ok(Self { policy, complex_terms })
    }

    pub fn with_defaults() -> Result<Self, regex::Error> {
        Self::new(EscalationPolicy::default(), COMPLEX_JURISPRUDENCE_TERMS)
    }

    pub fn mentions_complex_jurisprudence(&self, content: &str) -> bool {
        self.complex_terms.is_match(content)
    }

    pub fn evaluate_escalation(
        &self,
        request: &ModerationRequest,
        appropriateness: f64,
        islamic_compliance: &ComplianceResult,
        cultural_sensitivity: &CulturalSensitivity,
        degraded: DegradedChecks,
    ) -> EscalationResult {
        let policy = &self.policy;
        let mut reasons = Vec::new();
        let mut severity = Severity::Low;
        let mut reviewer = ReviewerType::Ai;

        // Each rule is independent; severity and reviewer only ever go up
        let mut raise = |reason: &str, at_least: Severity, reviewer_at_least: ReviewerType| {
            reasons.push(reason.to_string());
            severity = severity.max(at_least);
            reviewer = reviewer.max(reviewer_at_least);
        };

        if appropriateness < policy.appropriateness_floor {
            raise("Low confidence in content assessment", Severity::Medium, ReviewerType::Human);
        }
        if islamic_compliance.score < policy.compliance_floor {
            raise("Islamic compliance below threshold", Severity::High, ReviewerType::Human);
        }
        if islamic_compliance.violations.len() >= policy.max_violations {
            raise("Multiple compliance violations", Severity::High, ReviewerType::Human);
        }
        if self.mentions_complex_jurisprudence(&request.content) {
            raise("Complex Islamic jurisprudence topic", Severity::Medium, ReviewerType::Scholar);
        }
        if cultural_sensitivity.score < policy.cultural_floor {
            raise("Cultural sensitivity concerns", Severity::Medium, ReviewerType::Human);
        }
        if degraded.any() {
            raise("Automated analysis incomplete", Severity::Low, ReviewerType::Human);
        }

        let required = !reasons.is_empty();
        let guardian_alert = self.guardian_alert(appropriateness, islamic_compliance, cultural_sensitivity);

        let recommended_action = if !required {
            "approve"
        } else if reviewer == ReviewerType::Scholar {
            "hold for scholar review"
        } else if severity == Severity::High {
            "hold message and notify reviewer"
        } else {
            "queue for human review"
        };

        EscalationResult {
            required,
            reason: reasons.join("; "),
            reasons,
            severity,
            reviewer_type: reviewer,
            priority: priority(severity, reviewer, &guardian_alert),
            estimated_review_minutes: estimated_review_minutes(severity, reviewer),
            guardian_alert,
            recommended_action: recommended_action.to_string(),
        }
    }

    /// Guardian notification, independent of whether review is required
    pub fn guardian_alert(
        &self,
        appropriateness: f64,
        islamic_compliance: &ComplianceResult,
        cultural_sensitivity: &CulturalSensitivity,
    ) -> GuardianAlert {
        let policy = &self.policy;
        let mut reasons = Vec::new();
        let mut actions = Vec::new();

        if islamic_compliance.score < policy.guardian_compliance_floor {
            reasons.push("Message conflicts with Islamic guidelines".to_string());
            actions.push("Review the conversation with your ward".to_string());
        }
        if appropriateness < policy.guardian_appropriateness_floor {
            reasons.push("Inappropriate content detected".to_string());
            actions.push("Discuss appropriate conduct with both families".to_string());
        }
        if cultural_sensitivity.score < policy.guardian_cultural_floor {
            reasons.push("Culturally insensitive content".to_string());
            actions.push("Guide the conversation towards mutual respect".to_string());
        }
        if islamic_compliance.has_violation(Violation::AloneMeetings) {
            reasons.push("Request to meet without a mahram".to_string());
            actions.push("Arrange any meeting with a wali or family member present".to_string());
        }
        if islamic_compliance.has_violation(Violation::PhysicalReferences) {
            reasons.push("References to physical contact".to_string());
            actions.push("Intervene and remind both parties of Islamic boundaries".to_string());
        }

        if reasons.is_empty() {
            GuardianAlert::None
        } else {
            GuardianAlert::Alert {
                severity: Severity::High,
                reasons,
                suggested_actions: actions,
            }
        }
    }

    /// Materialise a pending ticket for a required escalation
    pub fn create_ticket(&self, request: &ModerationRequest, escalation: &EscalationResult) -> Option<EscalationTicket> {
        if !escalation.required {
            return None;
        }

        Some(EscalationTicket {
            id: generate_ticket_id(),
            created_at: Utc::now(),
            user_id: request.user_id.clone(),
            content: request.clone(),
            escalation: escalation.clone(),
            status: TicketStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> EscalationSystem {
        EscalationSystem::with_defaults().unwrap()
    }

    fn compliance(score: f64, violations: Vec<Violation>) -> ComplianceResult {
        ComplianceResult {
            score,
            confidence: 0.8,
            violations,
            guidance: None,
            recommendations: vec![],
            cultural_notes: vec![],
        }
    }

    fn cultural(score: f64) -> CulturalSensitivity {
        CulturalSensitivity {
            score,
            confidence: 0.8,
            concerns: vec![],
            suggestions: vec![],
            degraded: false,
        }
    }

    #[test]
    fn test_clean_content_not_escalated() {
        let request = ModerationRequest::message("u1", "Assalamu alaikum");
        let result = system().evaluate_escalation(&request, 0.9, &compliance(0.9, vec![]), &cultural(0.9), DegradedChecks::default());

        assert!(!result.required);
        assert_eq!(result.reviewer_type, ReviewerType::Ai);
        assert_eq!(result.guardian_alert, GuardianAlert::None);
        assert_eq!(result.recommended_action, "approve");
        assert_eq!(result.priority, 15);
        assert_eq!(result.estimated_review_minutes, 1.0);
    }

    #[test]
    fn test_low_compliance_is_high_human() {
        let request = ModerationRequest::message("u1", "text");
        let result = system().evaluate_escalation(&request, 0.8, &compliance(0.65, vec![]), &cultural(0.9), DegradedChecks::default());

        assert!(result.required);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.reviewer_type, ReviewerType::Human);
        assert_eq!(result.estimated_review_minutes, 30.0);
    }

    #[test]
    fn test_jurisprudence_goes_to_scholar() {
        let request = ModerationRequest::message("u1", "What is your view on polygamy?");
        let result = system().evaluate_escalation(&request, 0.5, &compliance(0.9, vec![]), &cultural(0.9), DegradedChecks::default());

        assert!(result.required);
        assert_eq!(result.reviewer_type, ReviewerType::Scholar);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.recommended_action, "hold for scholar review");
        // medium 20 + scholar 15
        assert_eq!(result.priority, 35);
        assert_eq!(result.estimated_review_minutes, 90.0);
    }

    #[test]
    fn test_cultural_concern_raises_to_medium() {
        let request = ModerationRequest::message("u1", "text");
        let result = system().evaluate_escalation(&request, 0.8, &compliance(0.9, vec![]), &cultural(0.6), DegradedChecks::default());
        assert!(result.required);
        assert_eq!(result.severity, Severity::Medium);
    }

    #[test]
    fn test_degraded_analysis_escalates() {
        let request = ModerationRequest::message("u1", "text");
        let degraded = DegradedChecks {
            analysis: true,
            analysis_requests_review: true,
            ..DegradedChecks::default()
        };
        let result = system().evaluate_escalation(&request, 0.8, &compliance(0.9, vec![]), &cultural(0.9), degraded);
        assert!(result.required);
        assert_eq!(result.severity, Severity::Low);
        assert_eq!(result.reviewer_type, ReviewerType::Human);
    }

    #[test]
    fn test_guardian_alert_on_alone_meetings() {
        let alert = system().guardian_alert(0.9, &compliance(0.9, vec![Violation::AloneMeetings]), &cultural(0.9));
        assert_eq!(alert.severity(), Some(Severity::High));
    }

    #[test]
    fn test_priority_capped_and_additive() {
        let alert = GuardianAlert::Alert {
            severity: Severity::High,
            reasons: vec![],
            suggested_actions: vec![],
        };
        assert_eq!(priority(Severity::High, ReviewerType::Scholar, &alert), 65);
        assert_eq!(priority(Severity::Low, ReviewerType::Ai, &GuardianAlert::None), 15);
    }

    #[test]
    fn test_more_violations_never_lower_priority() {
        let all = [
            Violation::ConcerningLanguage,
            Violation::InappropriateDating,
            Violation::PhysicalReferences,
            Violation::AloneMeetings,
            Violation::Secrecy,
        ];
        let request = ModerationRequest::message("u1", "text");
        let s = system();
        let mut previous = 0;
        for n in 0..=all.len() {
            let result = s.evaluate_escalation(
                &request,
                0.8,
                &compliance(0.75, all[..n].to_vec()),
                &cultural(0.9),
                DegradedChecks::default(),
            );
            assert!(result.priority >= previous, "priority dropped at {} violations", n);
            previous = result.priority;
        }
    }

    #[test]
    fn test_ticket_only_when_required() {
        let s = system();
        let request = ModerationRequest::message("u1", "text");
        let clean = s.evaluate_escalation(&request, 0.9, &compliance(0.9, vec![]), &cultural(0.9), DegradedChecks::default());
        assert!(s.create_ticket(&request, &clean).is_none());

        let flagged = s.evaluate_escalation(&request, 0.2, &compliance(0.3, vec![]), &cultural(0.9), DegradedChecks::default());
        let ticket = s.create_ticket(&request, &flagged).unwrap();
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.id.starts_with("ESC-"));
        assert_eq!(ticket.content.content, "text");
    }

    #[test]
    fn test_ticket_id_format() {
        let id = generate_ticket_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ESC");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }
}
