use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::core::cultural::{CulturalRules, FamilyInvolvement};
use crate::core::similarity::unit;
use crate::models::{ComplianceResult, ContentType, CulturalContext, Guidance, PracticeLevel, Violation};

/// Neutral starting score before any signal is applied
pub const BASELINE_SCORE: f64 = 0.7;

#[derive(Debug, Error)]
#[error("Invalid term pattern for {signal:?}: {source}")]
pub struct RuleError {
    pub signal: Signal,
    #[source]
    pub source: regex::Error,
}

/// Content signals the checker detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    Encouraged,
    Acceptable,
    IslamicGreeting,
    IslamicPhrase,
    ReligiousContent,
    FamilyMention,
    MarriageIntent,
    Concerning,
    Prohibited,
    InappropriateDating,
    PhysicalReferences,
    AloneMeetings,
    Secrecy,
    ProhibitedSubstances,
}

/// How one signal affects the score
#[derive(Debug, Clone)]
pub struct SignalRule {
    pub signal: Signal,
    /// Added to the score; negative for penalties
    pub adjustment: f64,
    pub violation: Option<Violation>,
    pub terms: Vec<&'static str>,
}

impl SignalRule {
    pub fn is_positive(&self) -> bool {
        self.adjustment > 0.0
    }
}

/// Built-in rule table
pub fn default_rules() -> Vec<SignalRule> {
    use Signal::*;

    let rule = |signal, adjustment, violation, terms: &[&'static str]| SignalRule {
        signal,
        adjustment,
        violation,
        terms: terms.to_vec(),
    };

    vec![
        rule(Encouraged, 0.12, None, &[
            "halal", "chaperone", "chaperoned", "with my wali", "with your wali",
            "family present", "istikhara", "in a public place with family",
        ]),
        rule(Acceptable, 0.05, None, &[
            "respect", "kindness", "honest", "honesty", "values", "goals",
            "education", "career", "hobbies", "good character",
        ]),
        rule(IslamicGreeting, 0.10, None, &[
            "assalamu alaikum", "assalamu alaykum", "as-salamu alaykum", "assalamualaikum",
            "salamu alaikum", "salaam alaikum", "salam alaikum", "wa alaikum assalam",
            "walaikum assalam", "salaam", "salam",
        ]),
        rule(IslamicPhrase, 0.08, None, &[
            "inshallah", "insha'allah", "in sha allah", "mashallah", "masha'allah",
            "alhamdulillah", "subhanallah", "jazakallah", "jazakallahu khairan",
            "bismillah", "barakallah", "barakallahu feek",
        ]),
        rule(ReligiousContent, 0.05, None, &[
            "prayer", "prayers", "salah", "salat", "quran", "qur'an", "mosque", "masjid",
            "deen", "islam", "islamic", "sunnah", "ramadan", "hajj", "umrah", "fasting",
        ]),
        rule(FamilyMention, 0.08, None, &[
            "family", "families", "parents", "wali", "guardian", "mother", "father",
            "brother", "sister", "mahram", "my mum", "my dad",
        ]),
        rule(MarriageIntent, 0.08, None, &[
            "marriage", "nikah", "marry", "married life", "spouse", "matrimonial",
            "future wife", "future husband",
        ]),
        rule(Concerning, -0.20, Some(Violation::ConcerningLanguage), &[
            "sexy", "hot", "flirt", "flirting", "party", "clubbing", "nightclub", "babe", "baby girl",
        ]),
        rule(Prohibited, -0.40, Some(Violation::ProhibitedContent), &[
            "zina", "sex", "sexual", "nudes", "nude", "porn", "hookup", "hook-up",
            "one night stand", "friends with benefits",
        ]),
        rule(InappropriateDating, -0.25, Some(Violation::InappropriateDating), &[
            "date me", "dating", "boyfriend", "girlfriend", "go out with me",
            "casual relationship", "just for fun", "no strings",
        ]),
        rule(PhysicalReferences, -0.30, Some(Violation::PhysicalReferences), &[
            "kiss", "kissing", "hug", "hugging", "cuddle", "cuddling", "touch you",
            "hold hands", "your body", "your lips", "in bed",
        ]),
        rule(AloneMeetings, -0.30, Some(Violation::AloneMeetings), &[
            "meet alone", "meet up alone", "alone together", "just the two of us", "just us two",
            "without your family", "without your parents", "without your wali", "come to my place",
            "come over to my place", "hotel room", "private place",
        ]),
        rule(Secrecy, -0.20, Some(Violation::Secrecy), &[
            "don't tell anyone", "dont tell anyone", "don’t tell anyone", "keep it secret",
            "keep this secret", "our secret", "our little secret", "delete this chat",
            "don't tell your parents", "dont tell your parents", "don’t tell your parents",
        ]),
        rule(ProhibitedSubstances, -0.30, Some(Violation::ProhibitedSubstances), &[
            "alcohol", "beer", "wine", "vodka", "drunk", "drinks at the bar", "drugs", "weed",
            "cocaine", "gambling", "casino", "pork",
        ]),
    ]
}

struct CompiledRule {
    rule: SignalRule,
    pattern: Regex,
}

/// Religiosity multiplier from the sender's prayer frequency
pub fn religiosity_multiplier(prayer_frequency: Option<PracticeLevel>) -> f64 {
    match prayer_frequency {
        Some(PracticeLevel::Always) => 1.1,
        Some(PracticeLevel::Often) => 1.05,
        Some(PracticeLevel::Sometimes) | None => 1.0,
        Some(PracticeLevel::Never) => 0.95,
    }
}

/// Rule-based Islamic compliance scorer
///
/// Term lists compile once at construction; the checker is immutable afterwards.
pub struct IslamicComplianceChecker {
    rules: Vec<CompiledRule>,
    cultural: CulturalRules,
}

impl IslamicComplianceChecker {
    pub fn new(rules: Vec<SignalRule>, cultural: CulturalRules) -> Result<Self, RuleError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let alternatives = rule
                    .terms
                    .iter()
                    .map(|term| regex::escape(term))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives))
                    .map_err(|source| RuleError { signal: rule.signal, source })?;
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(Self { rules, cultural })
    }

    pub fn with_defaults() -> Result<Self, RuleError> {
        Self::new(default_rules(), CulturalRules::default())
    }

    fn rule(&self, signal: Signal) -> Option<&SignalRule> {
        self.rules.iter().map(|c| &c.rule).find(|r| r.signal == signal)
    }

    /// Signals present in the text
    pub fn detect_signals(&self, content: &str) -> BTreeSet<Signal> {
        self.rules
            .iter()
            .filter(|compiled| compiled.pattern.is_match(content))
            .map(|compiled| compiled.rule.signal)
            .collect()
    }

    /// Pure score from a signal set
    pub fn score_signals(&self, signals: &BTreeSet<Signal>, prayer_frequency: Option<PracticeLevel>) -> f64 {
        let adjustment: f64 = signals
            .iter()
            .filter_map(|signal| self.rule(*signal))
            .map(|rule| rule.adjustment)
            .sum();

        unit((BASELINE_SCORE + adjustment) * religiosity_multiplier(prayer_frequency))
    }

    /// Violations named by the detected signals
    pub fn violations(&self, signals: &BTreeSet<Signal>) -> Vec<Violation> {
        signals
            .iter()
            .filter_map(|signal| self.rule(*signal).and_then(|rule| rule.violation))
            .collect()
    }

    pub fn confidence(&self, signals: &BTreeSet<Signal>, word_count: usize) -> f64 {
        let positives = signals
            .iter()
            .filter(|s| self.rule(**s).map_or(false, SignalRule::is_positive))
            .count();
        let negatives = signals.len() - positives;

        let mut confidence = 0.6 + 0.05 * signals.len().min(6) as f64;
        if word_count < 5 {
            confidence -= 0.2;
        }
        if positives > 0 && negatives > 0 {
            confidence -= 0.15;
        }
        confidence.clamp(0.1, 1.0)
    }

    /// Full compliance check
    pub fn check_compliance(
        &self,
        content: &str,
        content_type: ContentType,
        cultural_context: &CulturalContext,
    ) -> ComplianceResult {
        let signals = self.detect_signals(content);
        let word_count = content.split_whitespace().count();
        let violations = self.violations(&signals);

        let result = ComplianceResult {
            score: self.score_signals(&signals, cultural_context.sender_prayer_frequency),
            confidence: self.confidence(&signals, word_count),
            guidance: guidance_for(&violations),
            recommendations: recommendations(&signals, content_type),
            cultural_notes: self.cultural_notes(cultural_context),
            violations,
        };

        tracing::debug!(
            "Compliance check: score {:.2}, {} signals, {} violations",
            result.score,
            signals.len(),
            result.violations.len()
        );

        result
    }

    fn cultural_notes(&self, context: &CulturalContext) -> Vec<String> {
        let mut notes = Vec::new();
        let backgrounds = [context.sender_background.as_deref(), context.recipient_background.as_deref()];

        for background in backgrounds.into_iter().flatten() {
            if let Some(profile) = self.cultural.profile_for(background) {
                for note in &profile.notes {
                    if !notes.contains(note) {
                        notes.push(note.clone());
                    }
                }
                if profile.family_involvement == FamilyInvolvement::High && !context.guardian_supervised {
                    let note = "Family involvement is expected early in this culture".to_string();
                    if !notes.contains(&note) {
                        notes.push(note);
                    }
                }
            }
        }

        notes
    }
}

fn revision_for(violation: Violation) -> &'static str {
    match violation {
        Violation::ConcerningLanguage => "Use respectful language and avoid comments on appearance",
        Violation::ProhibitedContent => "Remove references to intimacy outside of marriage",
        Violation::InappropriateDating => "Frame the conversation around marriage rather than dating",
        Violation::PhysicalReferences => "Avoid references to physical contact",
        Violation::AloneMeetings => "Suggest meeting in a public place with a wali or family member present",
        Violation::Secrecy => "Keep families informed; conversations should never be hidden",
        Violation::ProhibitedSubstances => "Remove references to alcohol, drugs or gambling",
    }
}

/// Guidance shown to a sender whose content raised violations
pub fn guidance_for(violations: &[Violation]) -> Option<Guidance> {
    if violations.is_empty() {
        return None;
    }

    Some(Guidance {
        message: "This message may not meet our Islamic conduct guidelines. Please revise it before sending."
            .to_string(),
        revisions: violations.iter().map(|v| revision_for(*v).to_string()).collect(),
    })
}

fn recommendations(signals: &BTreeSet<Signal>, content_type: ContentType) -> Vec<String> {
    let mut recommendations = Vec::new();

    if content_type == ContentType::Message && !signals.contains(&Signal::IslamicGreeting) {
        recommendations.push("Consider opening with an Islamic greeting such as \"Assalamu alaikum\"".to_string());
    }
    if !signals.contains(&Signal::FamilyMention) && !signals.contains(&Signal::MarriageIntent) {
        recommendations.push("Keep the conversation focused on marriage and involve family early".to_string());
    }
    if content_type == ContentType::ProfileBio && !signals.contains(&Signal::ReligiousContent) {
        recommendations.push("Mention the role of faith in your life".to_string());
    }

    recommendations
}
