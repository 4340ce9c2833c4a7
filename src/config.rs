use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Docpipe server.
///
/// Construct one instance near process start via [`Config::from_env`] and hand it to the
/// pipeline explicitly. Nothing in the crate reads configuration from global state, so tests
/// can build a `Config` literal with whatever values they need.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the AI extraction service used for binary documents.
    pub extraction_url: String,
    /// Optional API key sent to the extraction service.
    pub extraction_api_key: Option<String>,
    /// Base URL of the embedding service.
    pub embedding_url: String,
    /// Optional API key sent to the embedding service.
    pub embedding_api_key: Option<String>,
    /// Embedding model identifier passed to the provider and recorded on processed documents.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Upper bound, in characters, applied by every chunking strategy.
    pub max_chunk_size: usize,
    /// Retry policy applied around remote embedding calls.
    pub retry: RetryConfig,
    /// Token budget for the extraction structure-overview call.
    pub extraction_overview_tokens: u32,
    /// Token budget for each extraction content-segment call.
    pub extraction_segment_tokens: u32,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Bounded retry/backoff settings for the embedding client.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total number of attempts, including the first call.
    pub max_attempts: u32,
    /// Base delay multiplied by the attempt number after a rate-limit response.
    pub rate_limit_base_delay: Duration,
    /// Fixed, shorter delay applied after non-rate-limit failures.
    pub failure_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base_delay: Duration::from_millis(1000),
            failure_delay: Duration::from_millis(250),
        }
    }
}

/// Default character budget shared by all chunking strategies.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1500;

const DEFAULT_OVERVIEW_TOKENS: u32 = 800;
const DEFAULT_SEGMENT_TOKENS: u32 = 1500;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            extraction_url: load_env("EXTRACTION_SERVICE_URL")?,
            extraction_api_key: load_env_optional("EXTRACTION_API_KEY"),
            embedding_url: load_env("EMBEDDING_SERVICE_URL")?,
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", load_env("EMBEDDING_DIMENSION")?)?,
            max_chunk_size: load_env_optional("MAX_CHUNK_SIZE")
                .map(|value| parse_env("MAX_CHUNK_SIZE", value))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_CHUNK_SIZE),
            retry: RetryConfig {
                max_attempts: load_env_optional("RETRY_MAX_ATTEMPTS")
                    .map(|value| parse_env("RETRY_MAX_ATTEMPTS", value))
                    .transpose()?
                    .unwrap_or(RetryConfig::default().max_attempts),
                rate_limit_base_delay: load_env_optional("RETRY_BASE_DELAY_MS")
                    .map(|value| parse_env("RETRY_BASE_DELAY_MS", value))
                    .transpose()?
                    .map(Duration::from_millis)
                    .unwrap_or(RetryConfig::default().rate_limit_base_delay),
                failure_delay: load_env_optional("RETRY_FAILURE_DELAY_MS")
                    .map(|value| parse_env("RETRY_FAILURE_DELAY_MS", value))
                    .transpose()?
                    .map(Duration::from_millis)
                    .unwrap_or(RetryConfig::default().failure_delay),
            },
            extraction_overview_tokens: load_env_optional("EXTRACTION_OVERVIEW_TOKENS")
                .map(|value| parse_env("EXTRACTION_OVERVIEW_TOKENS", value))
                .transpose()?
                .unwrap_or(DEFAULT_OVERVIEW_TOKENS),
            extraction_segment_tokens: load_env_optional("EXTRACTION_SEGMENT_TOKENS")
                .map(|value| parse_env("EXTRACTION_SEGMENT_TOKENS", value))
                .transpose()?
                .unwrap_or(DEFAULT_SEGMENT_TOKENS),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| parse_env("SERVER_PORT", value))
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults_match_documented_policy() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.rate_limit_base_delay, Duration::from_millis(1000));
        assert!(retry.failure_delay < retry.rate_limit_base_delay);
    }

    #[test]
    fn parse_env_reports_offending_key() {
        let error = parse_env::<usize>("EMBEDDING_DIMENSION", "not-a-number".into()).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "EMBEDDING_DIMENSION"));
    }
}
