//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Security Configuration
//!
//! - `API_KEY`: the inbound bearer key clients must present. The service
//!   refuses to operate while this is unset or still the shipped placeholder.
//! - `SF_TOKEN_FILE`: path to the file holding the upstream bearer token.
//!   The file is read fresh on every request so the token can be rotated
//!   without a restart.
//!
//! # Filter Policy
//!
//! - `DEFAULT_STATUS`: optional status value applied when the caller sends no
//!   `status` parameter (empty = no implicit status clause)
//! - `STATUS_ALLOW_LIST` / `SUB_STATUS_ALLOW_LIST` / `MODEL_ALLOW_LIST`:
//!   optional comma-separated allow-lists gating the enum-like filters
//!   (empty = any escaped value accepted)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, AppResult};

/// Placeholder API key shipped in example configuration.
///
/// An `API_KEY` equal to this value is treated the same as no key at all:
/// the service fails closed with HTTP 500 rather than accepting requests
/// guarded by a publicly known secret.
pub const PLACEHOLDER_API_KEY: &str = "change-me";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Salesforce Connection Configuration
    // =========================================================================
    /// Salesforce instance base URL, e.g. "https://example.my.salesforce.com"
    pub sf_base_url: Url,

    /// Salesforce REST API version used for query URLs (default: "58.0")
    pub sf_api_version: String,

    /// Path to the file holding the upstream bearer token.
    /// Read fresh on every request; never cached in memory.
    pub sf_token_file: PathBuf,

    /// Timeout for a single upstream request (default: 30 seconds)
    pub upstream_timeout: Duration,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Directory holding one cached JSON payload per distinct query
    pub cache_dir: PathBuf,

    /// Freshness window for cached responses (default: 300 seconds).
    /// Stale entries are still kept as a fallback when upstream is down.
    pub cache_ttl: Duration,

    // =========================================================================
    // Filter Limits & Policy
    // =========================================================================
    /// Maximum (and default) value for the `limit` parameter (default: 200)
    pub max_limit: u32,

    /// Maximum value for the `offset` parameter (default: 2000)
    pub max_offset: u32,

    /// Status applied when the caller sends no `status` parameter.
    /// `None` means no implicit status clause.
    pub default_status: Option<String>,

    /// Allowed values for the `status` filter (empty = any value accepted)
    pub status_allow_list: Vec<String>,

    /// Allowed values for the `sub_status` filter (empty = any value accepted)
    pub sub_status_allow_list: Vec<String>,

    /// Allowed values for the `model` filter (empty = any value accepted)
    pub model_allow_list: Vec<String>,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Inbound API key clients must present as `Authorization: Bearer <key>`.
    /// `None` (or the placeholder) makes every authenticated route fail closed.
    pub api_key: Option<String>,

    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any required configuration is invalid
    /// (e.g., non-numeric PORT value, unparseable SF_BASE_URL).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let sf_base_url = env::var("SF_BASE_URL")
            .unwrap_or_else(|_| "https://example.my.salesforce.com".to_string());
        let sf_base_url = Url::parse(sf_base_url.trim_end_matches('/'))
            .map_err(|e| AppError::ConfigError(format!("Invalid SF_BASE_URL: {e}")))?;

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Salesforce connection
            sf_base_url,
            sf_api_version: env::var("SF_API_VERSION").unwrap_or_else(|_| "58.0".to_string()),
            sf_token_file: PathBuf::from(
                env::var("SF_TOKEN_FILE").unwrap_or_else(|_| "/etc/unit-proxy/token".to_string()),
            ),
            upstream_timeout: Duration::from_secs(Self::parse_env("UPSTREAM_TIMEOUT_SECS", 30)?),

            // Cache
            cache_dir: PathBuf::from(
                env::var("CACHE_DIR").unwrap_or_else(|_| "/var/cache/unit-proxy".to_string()),
            ),
            cache_ttl: Duration::from_secs(Self::parse_env("CACHE_TTL_SECS", 300)?),

            // Filter limits & policy
            max_limit: Self::parse_env("MAX_LIMIT", 200)?,
            max_offset: Self::parse_env("MAX_OFFSET", 2000)?,
            default_status: env::var("DEFAULT_STATUS").ok().filter(|s| !s.is_empty()),
            status_allow_list: Self::parse_list("STATUS_ALLOW_LIST"),
            sub_status_allow_list: Self::parse_list("SUB_STATUS_ALLOW_LIST"),
            model_allow_list: Self::parse_list("MODEL_ALLOW_LIST"),

            // Security
            api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.max_limit == 0 {
            return Err(AppError::ConfigError(
                "MAX_LIMIT must be greater than 0".to_string(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "CACHE_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.sf_api_version.is_empty() {
            return Err(AppError::ConfigError(
                "SF_API_VERSION must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if a usable (non-placeholder) inbound API key is configured.
    ///
    /// When this returns false the service fails closed on every
    /// authenticated route instead of running unauthenticated.
    pub fn api_key_usable(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| k != PLACEHOLDER_API_KEY)
    }

    /// The versioned query endpoint, e.g.
    /// `https://example.my.salesforce.com/services/data/v58.0/query`.
    pub fn query_url(&self) -> String {
        format!(
            "{}/services/data/v{}/query",
            self.sf_base_url.as_str().trim_end_matches('/'),
            self.sf_api_version
        )
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated env var into a trimmed, non-empty list.
    fn parse_list(name: &str) -> Vec<String> {
        env::var(name)
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        #[allow(clippy::unwrap_used)] // static literal, cannot fail
        let sf_base_url = Url::parse("https://example.my.salesforce.com").unwrap();

        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Salesforce connection
            sf_base_url,
            sf_api_version: "58.0".to_string(),
            sf_token_file: PathBuf::from("/etc/unit-proxy/token"),
            upstream_timeout: Duration::from_secs(30),
            // Cache
            cache_dir: PathBuf::from("/var/cache/unit-proxy"),
            cache_ttl: Duration::from_secs(300),
            // Filter limits & policy
            max_limit: 200,
            max_offset: 2000,
            default_status: None,
            status_allow_list: vec![],
            sub_status_allow_list: vec![],
            model_allow_list: vec![],
            // Security
            api_key: None,
            cors_allowed_origins: vec!["*".to_string()],
            // Observability
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_limit, 200);
        assert_eq!(config.max_offset, 2000);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 3000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:3000");
    }

    #[test]
    fn test_query_url() {
        let config = Config::default();
        assert_eq!(
            config.query_url(),
            "https://example.my.salesforce.com/services/data/v58.0/query"
        );
    }

    #[test]
    fn test_api_key_usable() {
        let config = Config::default();
        assert!(!config.api_key_usable(), "missing key is unusable");

        let config = Config {
            api_key: Some(PLACEHOLDER_API_KEY.to_string()),
            ..Config::default()
        };
        assert!(!config.api_key_usable(), "placeholder key is unusable");

        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        assert!(config.api_key_usable());
    }

    #[test]
    fn test_validate_max_limit_zero() {
        let config = Config {
            max_limit: 0,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("MAX_LIMIT"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = Config {
            cache_ttl: Duration::ZERO,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("CACHE_TTL_SECS"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
