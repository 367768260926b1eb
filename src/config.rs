use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const ENV_PREFIX: &str = "NIKAH";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub profile_store: ProfileStoreSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// OpenAI-compatible model provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_moderation_model")]
    pub moderation_model: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            api_key: String::new(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            chat_model: default_chat_model(),
            moderation_model: default_moderation_model(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_provider_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_embedding_dimensions() -> usize { 1536 }
fn default_chat_model() -> String { "gpt-4o-mini".to_string() }
fn default_moderation_model() -> String { "omni-moderation-latest".to_string() }
fn default_provider_timeout() -> u64 { 30 }

/// Document store holding profiles and preferences
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStoreSettings {
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub database_id: String,
    #[serde(default = "default_profiles_collection")]
    pub profiles_collection: String,
    #[serde(default = "default_preferences_collection")]
    pub preferences_collection: String,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProfileStoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            api_key: String::new(),
            project_id: String::new(),
            database_id: String::new(),
            profiles_collection: default_profiles_collection(),
            preferences_collection: default_preferences_collection(),
            timeout_secs: default_store_timeout(),
        }
    }
}

fn default_store_endpoint() -> String { "http://localhost/v1".to_string() }
fn default_profiles_collection() -> String { "user_profiles".to_string() }
fn default_preferences_collection() -> String { "partner_preferences".to_string() }
fn default_store_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// L1-only when unset
    pub redis_url: Option<String>,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            l1_cache_size: default_l1_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_l1_cache_size() -> u64 { 10_000 }
fn default_cache_ttl() -> u64 { 86_400 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    /// Concurrent embedding generations while ranking
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Extra zone adjacency, merged into the built-in table
    #[serde(default)]
    pub nearby_zones: HashMap<String, Vec<String>>,
    /// Extra ethnicity group memberships, merged into the built-in table
    #[serde(default)]
    pub compatible_groups: HashMap<String, Vec<String>>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            max_concurrency: default_max_concurrency(),
            nearby_zones: HashMap::new(),
            compatible_groups: HashMap::new(),
        }
    }
}

impl MatchingSettings {
    /// Requested limit, defaulted and capped
    pub fn effective_limit(&self, requested: Option<u16>) -> usize {
        usize::from(requested.unwrap_or(self.default_limit).clamp(1, self.max_limit.max(1)))
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_max_concurrency() -> usize { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

fn default_batch_size() -> usize { 5 }
fn default_batch_delay_ms() -> u64 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    // e.g., NIKAH__SERVER__PORT -> server.port
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Serde defaults
    /// 2. config/default.toml, then config/local.toml
    /// 3. Environment variables prefixed with NIKAH__
    /// 4. Conventional OPENAI_API_KEY and REDIS_URL variables, when set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        apply_conventional_env(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

/// Fill secrets from the variable names most deployments already export
fn apply_conventional_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings.clone());

    if settings.get_string("provider.api_key").map_or(true, |k| k.is_empty()) {
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            builder = builder.set_override("provider.api_key", api_key)?;
        }
    }
    if settings.get_string("cache.redis_url").is_err() {
        if let Ok(redis_url) = env::var("REDIS_URL") {
            builder = builder.set_override("cache.redis_url", redis_url)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.provider.embedding_dimensions, 1536);
        assert_eq!(settings.provider.timeout_secs, 30);
        assert_eq!(settings.moderation.batch_size, 5);
        assert_eq!(settings.moderation.batch_delay_ms, 100);
        assert!(settings.cache.redis_url.is_none());
    }

    #[test]
    fn test_default_logging() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_format(), "json");
    }

    #[test]
    fn test_effective_limit() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.effective_limit(None), 20);
        assert_eq!(matching.effective_limit(Some(500)), 100);
        assert_eq!(matching.effective_limit(Some(0)), 1);
    }

    #[test]
    fn test_shipped_defaults_match_serde_defaults() {
        let shipped: Settings = toml::from_str(include_str!("../config/default.toml")).unwrap();
        let defaults = Settings::default();

        assert_eq!(shipped.server.port, defaults.server.port);
        assert_eq!(shipped.provider.embedding_model, defaults.provider.embedding_model);
        assert_eq!(shipped.provider.embedding_dimensions, defaults.provider.embedding_dimensions);
        assert_eq!(shipped.cache.ttl_secs, defaults.cache.ttl_secs);
        assert_eq!(shipped.matching.max_limit, defaults.matching.max_limit);
        assert_eq!(shipped.moderation.batch_size, defaults.moderation.batch_size);
        assert_eq!(shipped.logging.format, defaults.logging.format);
    }

    #[test]
    fn test_load_from_partial_file() {
        let path = std::env::temp_dir().join(format!("nikah-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[matching]
max_concurrency = 4

[matching.nearby_zones]
scotland = ["uk", "ireland"]
"#
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.matching.max_concurrency, 4);
        assert_eq!(settings.matching.nearby_zones["scotland"], vec!["uk", "ireland"]);
        assert_eq!(settings.provider.chat_model, "gpt-4o-mini");
    }
}
