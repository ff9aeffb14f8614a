//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SWEETSHOP_API_BASE_URL` - Base URL of the shop API (e.g., `https://shop.example.com`)
//!
//! ## Optional
//! - `SWEETSHOP_CATALOG_TIMEOUT_SECS` - Per-attempt catalog timeout (default: 10)
//! - `SWEETSHOP_CATALOG_RETRIES` - Catalog fetch attempts (default: 3)
//! - `SWEETSHOP_CATALOG_RETRY_DELAY_MS` - Pause between catalog attempts (default: 500)
//! - `SWEETSHOP_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SWEETSHOP_REFRESH_MIN_INTERVAL_SECS` - Minimum gap between visibility refreshes (default: 30)
//! - `SWEETSHOP_SESSION_FILE` - Session snapshot path (default: `<tmp>/sweetshop-session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog fetch behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Timeout for a single attempt
    pub timeout: Duration,
    /// Total attempts, including the first
    pub attempts: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    /// How long a fetched catalog is served from cache
    pub cache_ttl: Duration,
    /// Minimum gap between two visibility-triggered refreshes
    pub refresh_min_interval: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            attempts: 3,
            retry_delay: Duration::from_millis(500),
            cache_ttl: Duration::from_secs(300),
            refresh_min_interval: Duration::from_secs(30),
        }
    }
}

/// Shop API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint is resolved against
    pub base_url: Url,
    /// Catalog fetch, cache and refresh settings
    pub catalog: CatalogConfig,
    /// Where the session snapshot (cart, admin flag) lives
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Configuration for `base_url` with every other setting at its default.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            catalog: CatalogConfig::default(),
            session_file: default_session_file(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ApiConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let raw_base = env.required("SWEETSHOP_API_BASE_URL")?;
        let base_url = Url::parse(&raw_base).map_err(|e| {
            ConfigError::InvalidEnvVar("SWEETSHOP_API_BASE_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "SWEETSHOP_API_BASE_URL".to_string(),
                "URL cannot be used as a base".to_string(),
            ));
        }

        let catalog = CatalogConfig {
            timeout: Duration::from_secs(env.parse_or("SWEETSHOP_CATALOG_TIMEOUT_SECS", 10)?),
            attempts: env.parse_or("SWEETSHOP_CATALOG_RETRIES", 3)?,
            retry_delay: Duration::from_millis(env.parse_or("SWEETSHOP_CATALOG_RETRY_DELAY_MS", 500)?),
            cache_ttl: Duration::from_secs(env.parse_or("SWEETSHOP_CATALOG_CACHE_TTL_SECS", 300)?),
            refresh_min_interval: Duration::from_secs(
                env.parse_or("SWEETSHOP_REFRESH_MIN_INTERVAL_SECS", 30)?,
            ),
        };
        if catalog.attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SWEETSHOP_CATALOG_RETRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let session_file = env
            .optional("SWEETSHOP_SESSION_FILE")
            .map_or_else(default_session_file, PathBuf::from);

        Ok(Self {
            base_url,
            catalog,
            session_file,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

fn default_session_file() -> PathBuf {
    std::env::temp_dir().join("sweetshop-session.json")
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SWEETSHOP_API_BASE_URL", "https://shop.example.com")]).unwrap();
        assert_eq!(config.base_url.as_str(), "https://shop.example.com/");
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.catalog.attempts, 3);
        assert!(config.session_file.ends_with("sweetshop-session.json"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "SWEETSHOP_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[("SWEETSHOP_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("SWEETSHOP_API_BASE_URL", "mailto:shop@example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SWEETSHOP_API_BASE_URL", "http://localhost:5000"),
            ("SWEETSHOP_CATALOG_TIMEOUT_SECS", "4"),
            ("SWEETSHOP_CATALOG_RETRIES", "5"),
            ("SWEETSHOP_CATALOG_RETRY_DELAY_MS", "0"),
            ("SWEETSHOP_SESSION_FILE", "/var/lib/sweetshop/session.json"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();
        assert_eq!(config.catalog.timeout, Duration::from_secs(4));
        assert_eq!(config.catalog.attempts, 5);
        assert_eq!(config.catalog.retry_delay, Duration::ZERO);
        assert_eq!(
            config.session_file,
            PathBuf::from("/var/lib/sweetshop/session.json")
        );
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_unparseable_number() {
        let err = load(&[
            ("SWEETSHOP_API_BASE_URL", "http://localhost:5000"),
            ("SWEETSHOP_CATALOG_RETRIES", "three"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SWEETSHOP_CATALOG_RETRIES")
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = load(&[
            ("SWEETSHOP_API_BASE_URL", "http://localhost:5000"),
            ("SWEETSHOP_CATALOG_RETRIES", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
