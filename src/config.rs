use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Bearer token used when `API_BEARER_TOKEN` is not provided. Local development only.
pub const DEVELOPMENT_BEARER_TOKEN: &str = "supersecrettoken123";

/// Default upper bound for a single document fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 25;

/// Default cap on document size, applied to both remote downloads and uploads.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the policy QA server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token expected in the `Authorization: Bearer <token>` header.
    pub api_bearer_token: String,
    /// Whether the token came from the development fallback rather than the environment.
    pub using_development_token: bool,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Timeout applied to the remote document fetch.
    pub fetch_timeout: Duration,
    /// Largest document accepted, in bytes.
    pub max_document_bytes: usize,
    /// Optional JSON file replacing the built-in knowledge base.
    pub knowledge_base_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that `FOO=` in a `.env` file falls back to the
    /// default instead of failing validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let load = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (api_bearer_token, using_development_token) = match load("API_BEARER_TOKEN") {
            Some(token) => (token.trim().to_string(), false),
            None => (DEVELOPMENT_BEARER_TOKEN.to_string(), true),
        };

        Ok(Self {
            api_bearer_token,
            using_development_token,
            server_port: load("SERVER_PORT")
                .map(|value| parse_value::<u16>("SERVER_PORT", &value))
                .transpose()?,
            fetch_timeout: load("FETCH_TIMEOUT_SECS")
                .map(|value| parse_value::<u64>("FETCH_TIMEOUT_SECS", &value))
                .transpose()?
                .filter(|secs| *secs > 0)
                .map_or(
                    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
                    Duration::from_secs,
                ),
            max_document_bytes: load("MAX_DOCUMENT_BYTES")
                .map(|value| parse_value::<usize>("MAX_DOCUMENT_BYTES", &value))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_DOCUMENT_BYTES),
            knowledge_base_path: load("KNOWLEDGE_BASE_PATH").map(PathBuf::from),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_bearer_token: DEVELOPMENT_BEARER_TOKEN.to_string(),
            using_development_token: true,
            server_port: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            knowledge_base_path: None,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
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
        server_port = ?config.server_port,
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        max_document_bytes = config.max_document_bytes,
        knowledge_base_path = ?config.knowledge_base_path,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
