use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    BatchItemResult, BatchModerationRequest, BatchModerationResponse, ModerationRequest, SuggestionRequest,
};
use crate::routes::{error_response, validation_error, AppState};

/// Configure moderation and conversation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/moderation/check", web::post().to(check_content))
        .route("/moderation/batch", web::post().to(check_batch))
        .route("/conversation/suggestions", web::post().to(conversation_suggestions));
}

/// Moderate one piece of content
///
/// POST /api/v1/moderation/check
async fn check_content(state: web::Data<AppState>, req: web::Json<ModerationRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.moderation.moderate_content(&req).await {
        Ok(result) => {
            tracing::info!(
                "Moderated {} for {}: approved={}, escalated={}",
                req.content_type.as_str(),
                req.user_id,
                result.approved,
                result.escalation.required
            );
            HttpResponse::Ok().json(result)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, "Invalid content", e.to_string()),
    }
}

/// Moderate up to 100 items, returned in request order
///
/// POST /api/v1/moderation/batch
async fn check_batch(state: web::Data<AppState>, req: web::Json<BatchModerationRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let results = state
        .moderation
        .moderate_batch(&req.items)
        .await
        .into_iter()
        .map(|outcome| match outcome {
            Ok(result) => BatchItemResult::Moderated {
                result: Box::new(result),
            },
            Err(e) => BatchItemResult::Failed { error: e.to_string() },
        })
        .collect::<Vec<_>>();

    tracing::info!("Moderated batch of {} items", results.len());

    HttpResponse::Ok().json(BatchModerationResponse { results })
}

/// Stage-aware next-message suggestions
///
/// POST /api/v1/conversation/suggestions
async fn conversation_suggestions(
    state: web::Data<AppState>,
    req: web::Json<SuggestionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let suggestions = state.conversation.suggest(&req).await;
    HttpResponse::Ok().json(suggestions)
}
