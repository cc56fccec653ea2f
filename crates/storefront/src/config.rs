//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GSM_API_BASE_URL` - Backend base URL (default: `http://127.0.0.1:5000`)
//! - `GSM_STATE_PATH` - File holding the persisted credential and cart
//!   (default: `.green-street/state.json`)
//! - `GSM_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `GSM_PRODUCT_CACHE_TTL_SECS` - Product listing cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_STATE_PATH: &str = ".green-street/state.json";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub api_base_url: Url,
    /// Backing file of the persistent store
    pub state_path: PathBuf,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Lifetime of cached product listings
    pub product_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Configuration for `base_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            http_timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url =
            parse_base_url(&get_env_or_default("GSM_API_BASE_URL", DEFAULT_API_BASE_URL))?;
        let state_path = PathBuf::from(get_env_or_default("GSM_STATE_PATH", DEFAULT_STATE_PATH));
        let http_timeout = get_duration_secs("GSM_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let product_cache_ttl =
            get_duration_secs("GSM_PRODUCT_CACHE_TTL_SECS", DEFAULT_PRODUCT_CACHE_TTL_SECS)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            state_path,
            http_timeout,
            product_cache_ttl,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, normalising it to end with `/` so joins keep the path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("GSM_API_BASE_URL".to_string(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a whole number of seconds, rejecting zero.
fn get_duration_secs(key: &str, default: &str) -> Result<Duration, ConfigError> {
    let secs = get_env_or_default(key, default)
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/shop").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/shop/");
        assert_eq!(
            url.join("api/login").unwrap().as_str(),
            "http://localhost:5000/shop/api/login"
        );
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://example.org").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_for_base_url_uses_defaults() {
        let config = ClientConfig::for_base_url(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.state_path, PathBuf::from(".green-street/state.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
    }
}
