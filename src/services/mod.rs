// Service exports
pub mod cache;
pub mod openai;
pub mod profile_store;
pub mod providers;
pub mod sinks;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use openai::{OpenAiClient, OpenAiModels};
pub use profile_store::{
    InMemoryProfileStore, ProfileCollections, ProfileStore, ProfileStoreClient, ProfileStoreError,
    SharedProfileStore,
};
pub use providers::{
    EmbeddingProvider, ProviderError, SafetyClassifier, SharedEmbeddingProvider, SharedSafetyClassifier,
    SharedTextGenerator, TextGenerator,
};
pub use sinks::{
    AuditSink, GuardianNotifier, ReviewQueue, SinkError, TracingAuditSink, TracingGuardianNotifier,
    TracingReviewQueue,
};
