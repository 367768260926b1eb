use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use futures::stream::{self, StreamExt};
use validator::Validate;

use crate::core::embedding::EmbeddingGenerationError;
use crate::core::matcher::{MatchSide, SimilarityError};
use crate::models::{
    HealthResponse, PartnerPreferences, ProfileEmbeddings, RankMatchesRequest, RankMatchesResponse,
    ScoreMatchRequest, UserProfile,
};
use crate::routes::{error_response, validation_error, AppState};
use crate::services::ProfileStoreError;

/// Configure health and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score_match))
        .route("/matches/rank", web::post().to(rank_matches));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Failure while assembling one side of a comparison
enum MatchFailure {
    Store(ProfileStoreError),
    Embedding(EmbeddingGenerationError),
    Similarity(SimilarityError),
}

impl MatchFailure {
    fn into_response(self) -> HttpResponse {
        match self {
            MatchFailure::Store(ProfileStoreError::NotFound(message)) => {
                error_response(StatusCode::NOT_FOUND, "Profile not found", message)
            }
            MatchFailure::Store(e) => {
                tracing::error!("Profile store failure: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch profile", e.to_string())
            }
            MatchFailure::Embedding(e) => {
                tracing::error!("{}", e);
                error_response(StatusCode::BAD_GATEWAY, "Embedding generation failed", e.to_string())
            }
            MatchFailure::Similarity(e) => {
                tracing::error!("{}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Embeddings not comparable", e.to_string())
            }
        }
    }
}

/// Profile, preferences and embeddings for one member
struct LoadedMember {
    profile: UserProfile,
    preferences: PartnerPreferences,
    embeddings: ProfileEmbeddings,
}

impl LoadedMember {
    fn side(&self) -> MatchSide<'_> {
        MatchSide {
            profile: &self.profile,
            preferences: &self.preferences,
            embeddings: &self.embeddings,
        }
    }
}

async fn load_preferences(state: &AppState, user_id: &str) -> Result<PartnerPreferences, ProfileStoreError> {
    Ok(state
        .profiles
        .get_preferences(user_id)
        .await?
        .unwrap_or_else(|| PartnerPreferences::open(user_id)))
}

async fn embed_member(
    state: &AppState,
    profile: UserProfile,
    preferences: PartnerPreferences,
) -> Result<LoadedMember, MatchFailure> {
    let embeddings = state
        .cache
        .get_or_generate_embeddings(&state.embeddings, &profile, Some(&preferences))
        .await
        .map_err(MatchFailure::Embedding)?;

    Ok(LoadedMember {
        profile,
        preferences,
        embeddings,
    })
}

async fn load_member(state: &AppState, user_id: &str) -> Result<LoadedMember, MatchFailure> {
    let (profile, preferences) = tokio::try_join!(state.profiles.get_profile(user_id), load_preferences(state, user_id))
        .map_err(MatchFailure::Store)?;

    embed_member(state, profile, preferences).await
}

/// Score one candidate against a user
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// { "userId": "string", "candidateId": "string" }
/// ```
async fn score_match(state: web::Data<AppState>, req: web::Json<ScoreMatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    tracing::info!("Scoring {} against {}", req.user_id, req.candidate_id);

    let loaded = tokio::try_join!(load_member(&state, &req.user_id), load_member(&state, &req.candidate_id));
    let (user, candidate) = match loaded {
        Ok(members) => members,
        Err(failure) => return failure.into_response(),
    };

    match state
        .matcher
        .calculate_similarity(
            &user.embeddings,
            &candidate.embeddings,
            &user.profile,
            &candidate.profile,
            &user.preferences,
            &candidate.preferences,
        )
        .await
    {
        Ok(score) => HttpResponse::Ok().json(score),
        Err(e) => MatchFailure::Similarity(e).into_response(),
    }
}

/// Rank candidates for a user
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// { "userId": "string", "candidateIds": ["string"], "limit": 20 }
/// ```
///
/// Candidates that are missing or cannot be embedded are left out of the ranking.
async fn rank_matches(state: web::Data<AppState>, req: web::Json<RankMatchesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let limit = state.matching.effective_limit(req.limit);
    let user = match load_member(&state, &req.user_id).await {
        Ok(user) => user,
        Err(failure) => return failure.into_response(),
    };

    let mut candidate_ids: Vec<String> = req
        .candidate_ids
        .iter()
        .filter(|id| **id != req.user_id)
        .cloned()
        .collect();
    candidate_ids.sort();
    candidate_ids.dedup();

    let profiles = match state.profiles.get_profiles(&candidate_ids).await {
        Ok(profiles) => profiles,
        Err(e) => return MatchFailure::Store(e).into_response(),
    };

    tracing::info!(
        "Ranking {} of {} requested candidates for {}, limit {}",
        profiles.len(),
        candidate_ids.len(),
        req.user_id,
        limit
    );

    let state_ref = state.get_ref();
    let candidates: Vec<LoadedMember> = stream::iter(profiles)
        .map(|profile| async move {
            let preferences = match load_preferences(state_ref, &profile.user_id).await {
                Ok(preferences) => preferences,
                Err(e) => {
                    tracing::warn!("Using open preferences for {}: {}", profile.user_id, e);
                    PartnerPreferences::open(profile.user_id.as_str())
                }
            };
            embed_member(state_ref, profile, preferences).await
        })
        .buffer_unordered(state.matching.max_concurrency.max(1))
        .filter_map(|loaded| async move {
            match loaded {
                Ok(member) => Some(member),
                Err(MatchFailure::Embedding(e)) => {
                    tracing::warn!("Skipping candidate: {}", e);
                    None
                }
                Err(_) => None,
            }
        })
        .collect()
        .await;

    let sides: Vec<MatchSide<'_>> = candidates.iter().map(LoadedMember::side).collect();
    let ranked = state.matcher.rank(&user.side(), &sides, limit);
    let matches = state
        .matcher
        .explain_ranked(&user.profile, &sides, ranked, state.matching.max_concurrency)
        .await;

    HttpResponse::Ok().json(RankMatchesResponse {
        total_candidates: sides.len(),
        matches,
    })
}
