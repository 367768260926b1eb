// Core algorithm exports
pub mod cultural;
pub mod demographics;
pub mod embedding;
pub mod islamic;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use cultural::{CulturalProfile, CulturalRules, FamilyInvolvement};
pub use demographics::{demographic_score, marital_compatibility, DemographicRules};
pub use embedding::{EmbeddingGenerationError, EmbeddingGenerator, EmbeddingInputs};
pub use islamic::{islamic_factors, IslamicFactors, IslamicWeights};
pub use matcher::{template_explanation, MatchSide, SimilarityError, SimilarityMatcher};
pub use scoring::{EmbeddingWeights, MatchScoringPolicy, RuleWeights};
pub use similarity::cosine_similarity;
