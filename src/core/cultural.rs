use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::UserProfile;

pub const SAME_ETHNICITY_SCORE: f64 = 1.0;
pub const COMPATIBLE_GROUP_SCORE: f64 = 0.8;
/// Shared faith is the baseline; ethnicity never scores zero
pub const ETHNICITY_FLOOR: f64 = 0.6;
/// Zero shared languages still assumes an English fallback
pub const LANGUAGE_FLOOR: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyInvolvement {
    Moderate,
    High,
}

/// Conversation norms for one cultural group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CulturalProfile {
    pub group: String,
    pub greeting: String,
    pub family_involvement: FamilyInvolvement,
    pub notes: Vec<String>,
}

/// Immutable cultural rule set: compatible groups and per-group conversation norms
#[derive(Debug, Clone)]
pub struct CulturalRules {
    groups: HashMap<String, HashSet<String>>,
    profiles: HashMap<String, CulturalProfile>,
}

impl CulturalRules {
    pub fn new(groups: HashMap<String, Vec<String>>, profiles: Vec<CulturalProfile>) -> Self {
        let groups = groups
            .into_iter()
            .map(|(group, members)| {
                (
                    normalize(&group),
                    members.iter().map(|m| normalize(m)).collect::<HashSet<_>>(),
                )
            })
            .collect();

        let profiles = profiles
            .into_iter()
            .map(|profile| (normalize(&profile.group), profile))
            .collect();

        Self { groups, profiles }
    }

    /// Merge configured group memberships into the rule set
    pub fn with_group_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Self {
        for (group, members) in overrides {
            self.groups
                .entry(normalize(group))
                .or_default()
                .extend(members.iter().map(|m| normalize(m)));
        }
        self
    }

    /// Groups the given ethnicity (or group name) belongs to
    fn groups_of(&self, tag: &str) -> HashSet<&str> {
        let tag = normalize(tag);
        self.groups
            .iter()
            .filter(|(group, members)| **group == tag || members.contains(&tag))
            .map(|(group, _)| group.as_str())
            .collect()
    }

    pub fn are_compatible(&self, a: &str, b: &str) -> bool {
        let groups_a = self.groups_of(a);
        !groups_a.is_empty() && self.groups_of(b).iter().any(|g| groups_a.contains(g))
    }

    /// Conversation norms for an ethnicity or group tag
    pub fn profile_for(&self, background: &str) -> Option<&CulturalProfile> {
        let tag = normalize(background);
        if let Some(profile) = self.profiles.get(&tag) {
            return Some(profile);
        }
        let mut groups: Vec<&str> = self.groups_of(&tag).into_iter().collect();
        groups.sort_unstable();
        groups.into_iter().find_map(|group| self.profiles.get(group))
    }

    /// Ethnicity compatibility: exact 1.0, compatible group 0.8, otherwise 0.6
    pub fn ethnicity_compatibility(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) if normalize(a) == normalize(b) => SAME_ETHNICITY_SCORE,
            (Some(a), Some(b)) if self.are_compatible(a, b) => COMPATIBLE_GROUP_SCORE,
            _ => ETHNICITY_FLOOR,
        }
    }

    /// Average of ethnicity and language compatibility
    pub fn cultural_score(&self, profile_a: &UserProfile, profile_b: &UserProfile) -> f64 {
        let ethnicity = self.ethnicity_compatibility(profile_a.ethnicity.as_deref(), profile_b.ethnicity.as_deref());
        let languages = language_compatibility(&profile_a.languages, &profile_b.languages);
        (ethnicity + languages) / 2.0
    }
}

impl Default for CulturalRules {
    fn default() -> Self {
        let groups: HashMap<String, Vec<String>> = [
            ("south_asian", vec!["pakistani", "indian", "bangladeshi", "sri_lankan", "kashmiri"]),
            ("arab", vec!["egyptian", "syrian", "lebanese", "palestinian", "jordanian", "iraqi", "saudi", "emirati", "yemeni", "kuwaiti"]),
            ("north_african", vec!["moroccan", "algerian", "tunisian", "libyan", "egyptian"]),
            ("east_african", vec!["somali", "ethiopian", "eritrean", "sudanese"]),
            ("west_african", vec!["nigerian", "senegalese", "ghanaian", "malian", "gambian"]),
            ("southeast_asian", vec!["malay", "indonesian", "bruneian", "singaporean"]),
            ("turkic", vec!["turkish", "azerbaijani", "uzbek", "kazakh"]),
            ("persian", vec!["iranian", "afghan", "tajik"]),
        ]
        .into_iter()
        .map(|(g, members)| (g.to_string(), members.into_iter().map(String::from).collect()))
        .collect();

        let profile = |group: &str, greeting: &str, involvement, notes: &[&str]| CulturalProfile {
            group: group.to_string(),
            greeting: greeting.to_string(),
            family_involvement: involvement,
            notes: notes.iter().map(|n| n.to_string()).collect(),
        };

        let profiles = vec![
            profile(
                "south_asian",
                "Assalamu alaikum",
                FamilyInvolvement::High,
                &["Parents usually expect to be introduced early", "Address elders with respectful titles"],
            ),
            profile(
                "arab",
                "Assalamu alaikum wa rahmatullah",
                FamilyInvolvement::High,
                &["The wali is normally approached before serious discussion", "Formal greetings are valued"],
            ),
            profile(
                "north_african",
                "Assalamu alaikum",
                FamilyInvolvement::High,
                &["Family gatherings are the usual setting for getting to know each other"],
            ),
            profile(
                "east_african",
                "Assalamu alaikum",
                FamilyInvolvement::High,
                &["Clan and extended family may take part in the decision"],
            ),
            profile(
                "west_african",
                "Assalamu alaikum",
                FamilyInvolvement::High,
                &["Elders often lead the introductions between families"],
            ),
            profile(
                "southeast_asian",
                "Assalamualaikum",
                FamilyInvolvement::Moderate,
                &["Indirect, polite phrasing is preferred over blunt questions"],
            ),
            profile(
                "turkic",
                "Selamun aleyküm",
                FamilyInvolvement::Moderate,
                &["Families often meet over tea before any commitment"],
            ),
            profile(
                "persian",
                "Salaam alaikum",
                FamilyInvolvement::High,
                &["A formal visit by the family (khastegari) usually comes first"],
            ),
        ];

        CulturalRules::new(groups, profiles)
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Language overlap: 0 shared scores 0.2, each shared language adds, capped at 1.0
pub fn language_compatibility(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<String> = a.iter().map(|l| l.trim().to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|l| l.trim().to_lowercase()).collect();
    let shared = a.intersection(&b).count();

    if shared == 0 {
        LANGUAGE_FLOOR
    } else {
        (0.5 + 0.25 * shared as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_ethnicity_tiers() {
        let rules = CulturalRules::default();
        assert_eq!(rules.ethnicity_compatibility(Some("Pakistani"), Some("pakistani")), SAME_ETHNICITY_SCORE);
        assert_eq!(rules.ethnicity_compatibility(Some("pakistani"), Some("Indian")), COMPATIBLE_GROUP_SCORE);
        assert_eq!(rules.ethnicity_compatibility(Some("pakistani"), Some("somali")), ETHNICITY_FLOOR);
        assert_eq!(rules.ethnicity_compatibility(None, Some("somali")), ETHNICITY_FLOOR);
    }

    #[test]
    fn test_unknown_ethnicities_are_not_compatible() {
        let rules = CulturalRules::default();
        assert!(!rules.are_compatible("martian", "venusian"));
    }

    #[test]
    fn test_language_overlap() {
        assert_eq!(language_compatibility(&langs(&["urdu"]), &langs(&["arabic"])), LANGUAGE_FLOOR);
        assert_eq!(language_compatibility(&langs(&["english", "urdu"]), &langs(&["English"])), 0.75);
        assert_eq!(language_compatibility(&langs(&["english", "urdu"]), &langs(&["urdu", "english"])), 1.0);
        assert_eq!(language_compatibility(&[], &[]), LANGUAGE_FLOOR);
    }

    #[test]
    fn test_profile_lookup_by_ethnicity() {
        let rules = CulturalRules::default();
        let profile = rules.profile_for("Somali").unwrap();
        assert_eq!(profile.group, "east_african");
        assert!(rules.profile_for("south asian").is_some());
        assert!(rules.profile_for("unknown").is_none());
    }

    #[test]
    fn test_group_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("south_asian".to_string(), vec!["nepali".to_string()]);
        let rules = CulturalRules::default().with_group_overrides(&overrides);
        assert!(rules.are_compatible("nepali", "pakistani"));
    }
}
