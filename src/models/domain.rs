use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordinal practice scale shared by prayer frequency, modesty and religious knowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeLevel {
    Never,
    Sometimes,
    Often,
    Always,
}

impl PracticeLevel {
    /// Position on the ordinal scale (0..=3)
    pub fn rank(self) -> u8 {
        match self {
            PracticeLevel::Never => 0,
            PracticeLevel::Sometimes => 1,
            PracticeLevel::Often => 2,
            PracticeLevel::Always => 3,
        }
    }

    /// Number of levels between two values
    pub fn distance(self, other: PracticeLevel) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PracticeLevel::Never => "never",
            PracticeLevel::Sometimes => "sometimes",
            PracticeLevel::Often => "often",
            PracticeLevel::Always => "always",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    NeverMarried,
    Divorced,
    Widowed,
    Separated,
}

impl MaritalStatus {
    /// Divorced or widowed
    pub fn previously_married(self) -> bool {
        matches!(self, MaritalStatus::Divorced | MaritalStatus::Widowed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaritalStatus::NeverMarried => "never married",
            MaritalStatus::Divorced => "divorced",
            MaritalStatus::Widowed => "widowed",
            MaritalStatus::Separated => "separated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    Secondary,
    Diploma,
    Bachelors,
    Masters,
    Doctorate,
    IslamicStudies,
}

impl EducationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::Secondary => "secondary school",
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelors => "bachelor's degree",
            EducationLevel::Masters => "master's degree",
            EducationLevel::Doctorate => "doctorate",
            EducationLevel::IslamicStudies => "islamic studies",
        }
    }
}

/// Member profile as read from the external profile store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "birthYear")]
    pub birth_year: u16,
    pub gender: Gender,
    #[serde(rename = "locationZone")]
    pub location_zone: String,
    #[serde(rename = "maritalStatus")]
    pub marital_status: MaritalStatus,
    #[serde(rename = "hasChildren", default)]
    pub has_children: bool,
    #[serde(rename = "childrenCount", default)]
    pub children_count: u8,
    #[serde(rename = "prayerFrequency")]
    pub prayer_frequency: PracticeLevel,
    #[serde(rename = "modestyLevel")]
    pub modesty_level: PracticeLevel,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub education: Option<EducationLevel>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(rename = "personalityTraits", default)]
    pub personality_traits: Vec<String>,
    #[serde(rename = "wantsChildren", default)]
    pub wants_children: Option<bool>,
    #[serde(rename = "religiousKnowledge", default)]
    pub religious_knowledge: Option<PracticeLevel>,
}

impl UserProfile {
    /// Age in completed years for the given reference year
    pub fn age_in(&self, year: i32) -> u16 {
        (year - i32::from(self.birth_year)).max(0) as u16
    }

    /// Helper treating a positive children count as having children
    pub fn with_children(&self) -> bool {
        self.has_children || self.children_count > 0
    }
}

/// Inclusive age range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u16,
    pub max: u16,
}

impl AgeRange {
    pub fn contains(&self, age: u16) -> bool {
        age >= self.min && age <= self.max
    }
}

/// What a member is looking for in a spouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerPreferences {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "ageRange", default)]
    pub age_range: Option<AgeRange>,
    #[serde(rename = "locationZones", default)]
    pub location_zones: Vec<String>,
    #[serde(rename = "maritalStatuses", default)]
    pub marital_statuses: Vec<MaritalStatus>,
    #[serde(rename = "acceptsChildren", default)]
    pub accepts_children: Option<bool>,
    #[serde(rename = "educationFloor", default)]
    pub education_floor: Option<EducationLevel>,
}

impl PartnerPreferences {
    /// Preferences with no constraints at all
    pub fn open(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            age_range: None,
            location_zones: Vec::new(),
            marital_statuses: Vec::new(),
            accepts_children: None,
            education_floor: None,
        }
    }

    /// Absent preference means children are accepted
    pub fn children_accepted(&self) -> bool {
        self.accepts_children.unwrap_or(true)
    }

    /// Absent range means every age is acceptable
    pub fn accepts_age(&self, age: u16) -> bool {
        self.age_range.map_or(true, |range| range.contains(age))
    }
}

/// The five semantic buckets a profile is embedded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmbeddingDimension {
    Values,
    Interests,
    Lifestyle,
    Personality,
    ProfileText,
}

impl EmbeddingDimension {
    pub const ALL: [EmbeddingDimension; 5] = [
        EmbeddingDimension::Values,
        EmbeddingDimension::Interests,
        EmbeddingDimension::Lifestyle,
        EmbeddingDimension::Personality,
        EmbeddingDimension::ProfileText,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EmbeddingDimension::Values => "core values",
            EmbeddingDimension::Interests => "shared interests",
            EmbeddingDimension::Lifestyle => "lifestyle",
            EmbeddingDimension::Personality => "personality",
            EmbeddingDimension::ProfileText => "how you describe yourselves",
        }
    }
}

/// Semantic vectors generated for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEmbeddings {
    #[serde(rename = "profileId")]
    pub profile_id: String,
    pub values: Vec<f32>,
    pub interests: Vec<f32>,
    pub lifestyle: Vec<f32>,
    pub personality: Vec<f32>,
    #[serde(rename = "profileText")]
    pub profile_text: Vec<f32>,
    pub model: String,
    pub dimensions: usize,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    pub fingerprint: String,
}

impl ProfileEmbeddings {
    pub fn vector(&self, dimension: EmbeddingDimension) -> &[f32] {
        match dimension {
            EmbeddingDimension::Values => &self.values,
            EmbeddingDimension::Interests => &self.interests,
            EmbeddingDimension::Lifestyle => &self.lifestyle,
            EmbeddingDimension::Personality => &self.personality,
            EmbeddingDimension::ProfileText => &self.profile_text,
        }
    }
}

/// Per-dimension subscores, each in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscores {
    pub values: f64,
    pub interests: f64,
    pub lifestyle: f64,
    pub personality: f64,
    pub profile_text: f64,
    pub demographics: f64,
}

impl Subscores {
    pub fn embedding(&self, dimension: EmbeddingDimension) -> f64 {
        match dimension {
            EmbeddingDimension::Values => self.values,
            EmbeddingDimension::Interests => self.interests,
            EmbeddingDimension::Lifestyle => self.lifestyle,
            EmbeddingDimension::Personality => self.personality,
            EmbeddingDimension::ProfileText => self.profile_text,
        }
    }

    /// Labelled subscores in a fixed order, used for explanations
    pub fn labelled(&self) -> [(&'static str, f64); 6] {
        [
            (EmbeddingDimension::Values.label(), self.values),
            (EmbeddingDimension::Interests.label(), self.interests),
            (EmbeddingDimension::Lifestyle.label(), self.lifestyle),
            (EmbeddingDimension::Personality.label(), self.personality),
            (EmbeddingDimension::ProfileText.label(), self.profile_text),
            ("life circumstances", self.demographics),
        ]
    }
}

/// Deterministic part of a match evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub overall: f64,
    pub subscores: Subscores,
    pub islamic_alignment: f64,
    pub cultural_compatibility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    Generated,
    Template,
}

/// Full match evaluation returned to the ranking consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityScore {
    pub overall: f64,
    pub subscores: Subscores,
    pub islamic_alignment: f64,
    pub cultural_compatibility: f64,
    pub explanation: String,
    pub explanation_source: ExplanationSource,
}

impl SimilarityScore {
    pub fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            overall: self.overall,
            subscores: self.subscores,
            islamic_alignment: self.islamic_alignment,
            cultural_compatibility: self.cultural_compatibility,
        }
    }
}

/// Ranked candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatch {
    pub user_id: String,
    pub score: ScoreBreakdown,
    #[serde(default)]
    pub explanation: Option<String>,
}
