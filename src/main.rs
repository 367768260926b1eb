use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nikah_algo::config::Settings;
use nikah_algo::core::{CulturalRules, DemographicRules, EmbeddingGenerator, MatchScoringPolicy, SimilarityMatcher};
use nikah_algo::moderation::{
    ConversationIntelligence, EscalationSystem, IslamicComplianceChecker, ModerationSettings, ModerationSinks,
    ModerationSystem,
};
use nikah_algo::routes::{self, AppState};
use nikah_algo::services::{
    CacheManager, OpenAiClient, OpenAiModels, ProfileCollections, ProfileStoreClient, SharedTextGenerator,
};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap_or_else(|_| self.to_string()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // LOG_LEVEL / LOG_FORMAT win over the config file
    let (config_level, config_format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "json".to_string()),
    };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(config_level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(config_format);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting Nikah Algo matching and moderation service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;
    info!("Configuration loaded successfully");

    // Model provider: embeddings, safety classification and text generation
    let provider = &settings.provider;
    if provider.api_key.is_empty() {
        warn!("No provider API key configured; model calls will fail and moderation will degrade");
    }
    let openai = Arc::new(
        OpenAiClient::new(
            provider.base_url.clone(),
            provider.api_key.clone(),
            OpenAiModels {
                embedding_model: provider.embedding_model.clone(),
                embedding_dimensions: provider.embedding_dimensions,
                chat_model: provider.chat_model.clone(),
                moderation_model: provider.moderation_model.clone(),
            },
            provider.timeout_secs,
        )
        .map_err(|e| startup_error("Failed to create provider client", e))?,
    );
    let text: SharedTextGenerator = openai.clone();

    info!(
        "Provider client initialized (embeddings: {} x {}, chat: {})",
        provider.embedding_model, provider.embedding_dimensions, provider.chat_model
    );

    let store = &settings.profile_store;
    let profiles = Arc::new(
        ProfileStoreClient::new(
            store.endpoint.clone(),
            store.api_key.clone(),
            store.project_id.clone(),
            store.database_id.clone(),
            ProfileCollections {
                profiles: store.profiles_collection.clone(),
                preferences: store.preferences_collection.clone(),
            },
            store.timeout_secs,
        )
        .map_err(|e| startup_error("Failed to create profile store client", e))?,
    );

    info!("Profile store client initialized");

    // Redis is optional; fall back to the in-process tier
    let cache_settings = &settings.cache;
    let cache = match CacheManager::new(
        cache_settings.redis_url.as_deref(),
        cache_settings.l1_cache_size,
        cache_settings.ttl_secs,
    )
    .await
    {
        Ok(c) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s, Redis: {})",
                cache_settings.l1_cache_size,
                cache_settings.ttl_secs,
                cache_settings.redis_url.is_some()
            );
            Arc::new(c)
        }
        Err(e) => {
            error!("Failed to connect to Redis ({}), running with in-process cache only", e);
            Arc::new(CacheManager::in_memory(cache_settings.l1_cache_size, cache_settings.ttl_secs))
        }
    };

    // Rule sets are built once and never mutated
    let demographics = DemographicRules::default().with_overrides(&settings.matching.nearby_zones);
    let cultural = CulturalRules::default().with_group_overrides(&settings.matching.compatible_groups);

    let policy = MatchScoringPolicy::default();
    let unbalanced = policy.unbalanced_groups();
    if !unbalanced.is_empty() {
        return Err(startup_error("Scoring weights do not sum to 1.0", unbalanced.join(", ")));
    }
    let matcher = Arc::new(SimilarityMatcher::new(
        policy,
        demographics,
        cultural.clone(),
        Some(text.clone()),
    ));

    info!("Matcher initialized with policy: {:?}", policy);

    let compliance = Arc::new(
        IslamicComplianceChecker::new(nikah_algo::moderation::default_rules(), cultural.clone())
            .map_err(|e| startup_error("Invalid compliance rules", e))?,
    );
    let escalation =
        Arc::new(EscalationSystem::with_defaults().map_err(|e| startup_error("Invalid escalation terms", e))?);

    let moderation = Arc::new(ModerationSystem::new(
        openai.clone(),
        text.clone(),
        compliance,
        escalation,
        ModerationSinks::default(),
        ModerationSettings {
            batch_size: settings.moderation.batch_size,
            batch_delay_ms: settings.moderation.batch_delay_ms,
            timeout_secs: provider.timeout_secs,
        },
    ));

    let conversation = Arc::new(ConversationIntelligence::new(
        moderation.clone(),
        text,
        Arc::new(cultural),
        provider.timeout_secs,
    ));

    info!(
        "Moderation initialized (batch size: {}, delay: {}ms)",
        settings.moderation.batch_size, settings.moderation.batch_delay_ms
    );

    // Build application state
    let app_state = AppState {
        profiles,
        cache,
        embeddings: EmbeddingGenerator::new(openai),
        matcher,
        moderation,
        conversation,
        matching: settings.matching.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
