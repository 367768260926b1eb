// Route exports
pub mod matches;
pub mod moderation;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

use crate::config::MatchingSettings;
use crate::core::{EmbeddingGenerator, SimilarityMatcher};
use crate::models::ErrorResponse;
use crate::moderation::{ConversationIntelligence, ModerationSystem};
use crate::services::{CacheManager, SharedProfileStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: SharedProfileStore,
    pub cache: Arc<CacheManager>,
    pub embeddings: EmbeddingGenerator,
    pub matcher: Arc<SimilarityMatcher>,
    pub moderation: Arc<ModerationSystem>,
    pub conversation: Arc<ConversationIntelligence>,
    pub matching: MatchingSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(moderation::configure),
    );
}

/// JSON error body with a matching status code
pub(crate) fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string())
}
