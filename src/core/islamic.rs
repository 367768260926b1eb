use serde::{Deserialize, Serialize};

use crate::models::{PracticeLevel, UserProfile};

/// Credit used when a factor cannot be derived from the profiles
pub const UNKNOWN_FACTOR_SCORE: f64 = 0.7;
/// Community involvement is not captured yet
pub const COMMUNITY_INVOLVEMENT_DEFAULT: f64 = 0.7;

/// Alignment credit by ordinal distance (0..=3 levels apart)
pub const ORDINAL_ALIGNMENT: [f64; 4] = [1.0, 0.7, 0.4, 0.1];

/// Six Islamic-compatibility factors, each in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslamicFactors {
    pub prayer_alignment: f64,
    pub lifestyle_alignment: f64,
    pub family_values: f64,
    pub religious_knowledge: f64,
    pub community_involvement: f64,
    pub matrimonial_intent: f64,
}

/// Factor weights; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslamicWeights {
    pub prayer_alignment: f64,
    pub lifestyle_alignment: f64,
    pub family_values: f64,
    pub religious_knowledge: f64,
    pub community_involvement: f64,
    pub matrimonial_intent: f64,
}

impl Default for IslamicWeights {
    fn default() -> Self {
        Self {
            prayer_alignment: 0.25,
            lifestyle_alignment: 0.20,
            family_values: 0.20,
            religious_knowledge: 0.15,
            community_involvement: 0.10,
            matrimonial_intent: 0.10,
        }
    }
}

impl IslamicWeights {
    pub fn total(&self) -> f64 {
        self.prayer_alignment
            + self.lifestyle_alignment
            + self.family_values
            + self.religious_knowledge
            + self.community_involvement
            + self.matrimonial_intent
    }

    /// Weighted sum of the factors
    pub fn score(&self, factors: &IslamicFactors) -> f64 {
        factors.prayer_alignment * self.prayer_alignment
            + factors.lifestyle_alignment * self.lifestyle_alignment
            + factors.family_values * self.family_values
            + factors.religious_knowledge * self.religious_knowledge
            + factors.community_involvement * self.community_involvement
            + factors.matrimonial_intent * self.matrimonial_intent
    }
}

#[inline]
pub fn ordinal_alignment(a: PracticeLevel, b: PracticeLevel) -> f64 {
    ORDINAL_ALIGNMENT[usize::from(a.distance(b)).min(ORDINAL_ALIGNMENT.len() - 1)]
}

fn family_values_alignment(a: Option<bool>, b: Option<bool>) -> f64 {
    match (a, b) {
        (Some(x), Some(y)) if x == y => 1.0,
        (Some(_), Some(_)) => 0.4,
        _ => UNKNOWN_FACTOR_SCORE,
    }
}

fn knowledge_balance(a: Option<PracticeLevel>, b: Option<PracticeLevel>) -> f64 {
    match (a, b) {
        (Some(x), Some(y)) => ordinal_alignment(x, y),
        _ => UNKNOWN_FACTOR_SCORE,
    }
}

/// Derive the six factors from two profiles
pub fn islamic_factors(profile_a: &UserProfile, profile_b: &UserProfile) -> IslamicFactors {
    IslamicFactors {
        prayer_alignment: ordinal_alignment(profile_a.prayer_frequency, profile_b.prayer_frequency),
        lifestyle_alignment: ordinal_alignment(profile_a.modesty_level, profile_b.modesty_level),
        family_values: family_values_alignment(profile_a.wants_children, profile_b.wants_children),
        religious_knowledge: knowledge_balance(profile_a.religious_knowledge, profile_b.religious_knowledge),
        community_involvement: COMMUNITY_INVOLVEMENT_DEFAULT,
        // Both parties are on a matrimonial platform
        matrimonial_intent: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(value: f64) -> IslamicFactors {
        IslamicFactors {
            prayer_alignment: value,
            lifestyle_alignment: value,
            family_values: value,
            religious_knowledge: value,
            community_involvement: value,
            matrimonial_intent: value,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = IslamicWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-12);
        assert!((weights.score(&factors(1.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ordinal_table() {
        use PracticeLevel::*;
        assert_eq!(ordinal_alignment(Always, Always), 1.0);
        assert_eq!(ordinal_alignment(Always, Often), 0.7);
        assert_eq!(ordinal_alignment(Sometimes, Always), 0.4);
        assert_eq!(ordinal_alignment(Never, Always), 0.1);
    }

    #[test]
    fn test_raising_prayer_alignment_never_lowers_score() {
        let weights = IslamicWeights::default();
        let mut previous = f64::MIN;
        for step in 0..=10 {
            let mut f = factors(0.5);
            f.prayer_alignment = step as f64 / 10.0;
            let score = weights.score(&f);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_family_values_alignment() {
        assert_eq!(family_values_alignment(Some(true), Some(true)), 1.0);
        assert_eq!(family_values_alignment(Some(true), Some(false)), 0.4);
        assert_eq!(family_values_alignment(None, Some(false)), UNKNOWN_FACTOR_SCORE);
    }
}
