use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the semsearch server.
///
/// Every variable carries a fallback default, so an empty environment yields a
/// usable local-development configuration.
#[derive(Debug)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub http_port: u16,
    /// Hostname of the Typesense instance that stores embeddings.
    pub typesense_host: String,
    /// Port of the Typesense instance.
    pub typesense_port: u16,
    /// Optional API key required to access Typesense.
    pub typesense_api_key: Option<String>,
    /// Optional API key for the Google Generative Language API.
    pub google_api_key: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Generative model used for summarization.
    pub summarization_model: String,
    /// Dimensionality of the produced vectors; must match the store schema.
    pub embedding_dimension: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            http_port: load_env_parsed("HTTP_PORT", 8080)?,
            typesense_host: load_env_or("TYPESENSE_HOST", "localhost"),
            typesense_port: load_env_parsed("TYPESENSE_PORT", 8080)?,
            typesense_api_key: load_env_optional("TYPESENSE_API_KEY"),
            google_api_key: load_env_optional("GOOGLE_API_KEY"),
            embedding_model: load_env_or("EMBEDDING_MODEL", "embedding-001"),
            summarization_model: load_env_or("SUMMARIZATION_MODEL", "gemini-pro"),
            embedding_dimension: load_env_parsed("EMBEDDING_DIMENSION", 768)?,
        })
    }
}

fn load_env_or(key: &str, fallback: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| fallback.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str, fallback: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(fallback),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        http_port = config.http_port,
        typesense_host = %config.typesense_host,
        typesense_port = config.typesense_port,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
