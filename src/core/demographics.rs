use std::collections::{HashMap, HashSet};

use crate::models::{PartnerPreferences, UserProfile};

/// Credit for a candidate in the same location zone
pub const SAME_ZONE_SCORE: f64 = 1.0;
/// Credit for a candidate in an adjacent zone
pub const NEARBY_ZONE_SCORE: f64 = 0.7;
/// Baseline credit for any other zone
pub const DISTANT_ZONE_SCORE: f64 = 0.5;

/// Location adjacency table
///
/// Immutable after construction. Adjacency is symmetric: registering `a -> b` also makes
/// `b` near `a`.
#[derive(Debug, Clone)]
pub struct DemographicRules {
    nearby_zones: HashMap<String, HashSet<String>>,
}

impl DemographicRules {
    pub fn new<I, S>(adjacency: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut nearby_zones: HashMap<String, HashSet<String>> = HashMap::new();
        for (zone, neighbours) in adjacency {
            let zone = normalize_zone(zone.as_ref());
            for neighbour in neighbours {
                let neighbour = normalize_zone(neighbour.as_ref());
                nearby_zones
                    .entry(zone.clone())
                    .or_default()
                    .insert(neighbour.clone());
                nearby_zones.entry(neighbour).or_default().insert(zone.clone());
            }
        }
        Self { nearby_zones }
    }

    /// Add or replace adjacency entries from configuration
    pub fn with_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Self {
        let extra = DemographicRules::new(
            overrides
                .iter()
                .map(|(zone, neighbours)| (zone.as_str(), neighbours.iter().map(String::as_str).collect())),
        );
        for (zone, neighbours) in extra.nearby_zones {
            self.nearby_zones.entry(zone).or_default().extend(neighbours);
        }
        self
    }

    pub fn are_nearby(&self, a: &str, b: &str) -> bool {
        let a = normalize_zone(a);
        let b = normalize_zone(b);
        self.nearby_zones
            .get(&a)
            .map_or(false, |neighbours| neighbours.contains(&b))
    }
}

impl Default for DemographicRules {
    fn default() -> Self {
        DemographicRules::new(vec![
            ("uk", vec!["ireland", "europe_west"]),
            ("europe_west", vec!["europe_central", "europe_north"]),
            ("europe_central", vec!["europe_east", "turkey"]),
            ("us_east", vec!["us_central", "canada_east"]),
            ("us_west", vec!["us_central", "canada_west"]),
            ("canada_east", vec!["canada_west"]),
            ("gulf", vec!["middle_east", "south_asia"]),
            ("middle_east", vec!["north_africa", "turkey"]),
            ("north_africa", vec!["west_africa", "europe_west"]),
            ("east_africa", vec!["gulf", "west_africa"]),
            ("south_asia", vec!["southeast_asia"]),
            ("southeast_asia", vec!["australia"]),
        ])
    }
}

fn normalize_zone(zone: &str) -> String {
    zone.trim().to_lowercase()
}

/// Mutual age-range satisfaction
///
/// 1.0 if both preferred ranges include the other's age, 0.5 if only one does, else 0.
pub fn age_compatibility(
    profile_a: &UserProfile,
    profile_b: &UserProfile,
    prefs_a: &PartnerPreferences,
    prefs_b: &PartnerPreferences,
    reference_year: i32,
) -> f64 {
    let a_accepts_b = prefs_a.accepts_age(profile_b.age_in(reference_year));
    let b_accepts_a = prefs_b.accepts_age(profile_a.age_in(reference_year));

    match (a_accepts_b, b_accepts_a) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}

/// Location proximity; never zero since faith transcends geography
pub fn location_compatibility(rules: &DemographicRules, zone_a: &str, zone_b: &str) -> f64 {
    if normalize_zone(zone_a) == normalize_zone(zone_b) {
        SAME_ZONE_SCORE
    } else if rules.are_nearby(zone_a, zone_b) {
        NEARBY_ZONE_SCORE
    } else {
        DISTANT_ZONE_SCORE
    }
}

/// Education compatibility. Currently a permissive pass-through.
pub fn education_compatibility(
    _profile_a: &UserProfile,
    _profile_b: &UserProfile,
    _prefs_a: &PartnerPreferences,
    _prefs_b: &PartnerPreferences,
) -> f64 {
    1.0
}

/// Marital status / children decision table (symmetric)
pub fn marital_compatibility(
    profile_a: &UserProfile,
    profile_b: &UserProfile,
    prefs_a: &PartnerPreferences,
    prefs_b: &PartnerPreferences,
) -> f64 {
    use crate::models::MaritalStatus::NeverMarried;

    let a_never = profile_a.marital_status == NeverMarried;
    let b_never = profile_b.marital_status == NeverMarried;
    let a_prev = profile_a.marital_status.previously_married();
    let b_prev = profile_b.marital_status.previously_married();

    if a_never && b_never {
        return match (profile_a.with_children(), profile_b.with_children()) {
            (false, false) => 1.0,
            (true, false) | (false, true) => 0.8,
            (true, true) => 0.7,
        };
    }

    if a_prev && b_prev {
        return 0.9;
    }

    // One never married, the other previously married
    let mixed = if a_never && b_prev {
        Some((prefs_a, profile_b))
    } else if b_never && a_prev {
        Some((prefs_b, profile_a))
    } else {
        None
    };

    match mixed {
        Some((never_married_prefs, previously_married)) => {
            if previously_married.with_children() {
                if never_married_prefs.children_accepted() {
                    0.8
                } else {
                    0.3
                }
            } else {
                0.9
            }
        }
        None => 0.7,
    }
}

/// Average of the four demographic checks, in [0,1]
pub fn demographic_score(
    rules: &DemographicRules,
    profile_a: &UserProfile,
    profile_b: &UserProfile,
    prefs_a: &PartnerPreferences,
    prefs_b: &PartnerPreferences,
    reference_year: i32,
) -> f64 {
    let checks = [
        age_compatibility(profile_a, profile_b, prefs_a, prefs_b, reference_year),
        location_compatibility(rules, &profile_a.location_zone, &profile_b.location_zone),
        education_compatibility(profile_a, profile_b, prefs_a, prefs_b),
        marital_compatibility(profile_a, profile_b, prefs_a, prefs_b),
    ];

    checks.iter().sum::<f64>() / checks.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRange, Gender, MaritalStatus, PracticeLevel};

    fn create_test_profile(id: &str, birth_year: u16, status: MaritalStatus, children: bool) -> UserProfile {
        UserProfile {
            user_id: id.to_string(),
            birth_year,
            gender: Gender::Female,
            location_zone: "uk".to_string(),
            marital_status: status,
            has_children: children,
            children_count: if children { 1 } else { 0 },
            prayer_frequency: PracticeLevel::Often,
            modesty_level: PracticeLevel::Often,
            ethnicity: None,
            languages: vec![],
            education: None,
            profession: None,
            bio: None,
            interests: vec![],
            personality_traits: vec![],
            wants_children: None,
            religious_knowledge: None,
        }
    }

    fn prefs(id: &str, range: Option<(u16, u16)>, accepts_children: Option<bool>) -> PartnerPreferences {
        PartnerPreferences {
            age_range: range.map(|(min, max)| AgeRange { min, max }),
            accepts_children,
            ..PartnerPreferences::open(id)
        }
    }

    #[test]
    fn test_age_mutual_and_one_sided() {
        let a = create_test_profile("a", 1995, MaritalStatus::NeverMarried, false); // 30
        let b = create_test_profile("b", 1990, MaritalStatus::NeverMarried, false); // 35

        let both = age_compatibility(&a, &b, &prefs("a", Some((30, 40)), None), &prefs("b", Some((25, 32)), None), 2025);
        assert_eq!(both, 1.0);

        let one = age_compatibility(&a, &b, &prefs("a", Some((30, 40)), None), &prefs("b", Some((20, 25)), None), 2025);
        assert_eq!(one, 0.5);

        let none = age_compatibility(&a, &b, &prefs("a", Some((20, 25)), None), &prefs("b", Some((40, 45)), None), 2025);
        assert_eq!(none, 0.0);
    }

    #[test]
    fn test_location_tiers() {
        let rules = DemographicRules::default();
        assert_eq!(location_compatibility(&rules, "uk", "UK"), SAME_ZONE_SCORE);
        assert_eq!(location_compatibility(&rules, "uk", "ireland"), NEARBY_ZONE_SCORE);
        assert_eq!(location_compatibility(&rules, "ireland", "uk"), NEARBY_ZONE_SCORE);
        assert_eq!(location_compatibility(&rules, "uk", "australia"), DISTANT_ZONE_SCORE);
    }

    #[test]
    fn test_location_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("uk".to_string(), vec!["australia".to_string()]);
        let rules = DemographicRules::default().with_overrides(&overrides);
        assert!(rules.are_nearby("australia", "uk"));
        assert!(rules.are_nearby("uk", "ireland"));
    }

    #[test]
    fn test_marital_table_never_married_pairs() {
        let open = prefs("x", None, None);
        let a = create_test_profile("a", 1995, MaritalStatus::NeverMarried, false);
        let b = create_test_profile("b", 1993, MaritalStatus::NeverMarried, false);
        let c = create_test_profile("c", 1993, MaritalStatus::NeverMarried, true);

        assert_eq!(marital_compatibility(&a, &b, &open, &open), 1.0);
        assert_eq!(marital_compatibility(&a, &c, &open, &open), 0.8);
        assert_eq!(marital_compatibility(&c, &a, &open, &open), 0.8);
    }

    #[test]
    fn test_marital_table_mixed_pairs() {
        let never = create_test_profile("a", 1995, MaritalStatus::NeverMarried, false);
        let divorced_kids = create_test_profile("b", 1988, MaritalStatus::Divorced, true);
        let widowed = create_test_profile("c", 1988, MaritalStatus::Widowed, false);
        let rejects = prefs("a", None, Some(false));
        let accepts = prefs("a", None, Some(true));
        let open = prefs("b", None, None);

        assert_eq!(marital_compatibility(&never, &divorced_kids, &rejects, &open), 0.3);
        assert_eq!(marital_compatibility(&divorced_kids, &never, &open, &rejects), 0.3);
        assert_eq!(marital_compatibility(&never, &divorced_kids, &accepts, &open), 0.8);
        assert_eq!(marital_compatibility(&never, &widowed, &rejects, &open), 0.9);
        assert_eq!(marital_compatibility(&divorced_kids, &widowed, &open, &open), 0.9);
    }

    #[test]
    fn test_marital_table_default() {
        let open = prefs("x", None, None);
        let separated = create_test_profile("a", 1990, MaritalStatus::Separated, false);
        let never = create_test_profile("b", 1990, MaritalStatus::NeverMarried, false);
        assert_eq!(marital_compatibility(&separated, &never, &open, &open), 0.7);
    }

    #[test]
    fn test_demographic_score_in_range() {
        let rules = DemographicRules::default();
        let open = prefs("x", None, None);
        let a = create_test_profile("a", 1995, MaritalStatus::NeverMarried, false);
        let b = create_test_profile("b", 1994, MaritalStatus::NeverMarried, false);

        let score = demographic_score(&rules, &a, &b, &open, &open, 2025);
        assert_eq!(score, 1.0);
    }
}
