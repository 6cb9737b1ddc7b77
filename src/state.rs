//! Shared application state for Axum handlers.
//!
//! Cloned per request; everything inside is behind an `Arc`. The cache is
//! held as a trait object so tests (and future deployments) can swap the
//! file store for an in-memory one without touching the pipeline.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::{FileCache, ResponseCache};
use crate::config::Config;
use crate::error::AppResult;
use crate::upstream::SalesforceClient;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Response cache (file-backed in production)
    pub cache: Arc<dyn ResponseCache>,
    /// Upstream Salesforce client (shared connection pool)
    pub salesforce: SalesforceClient,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create application state with the file-backed cache from config.
    pub fn new(config: Config) -> AppResult<Self> {
        let cache = Arc::new(FileCache::new(config.cache_dir.clone()));
        Self::with_cache(config, cache)
    }

    /// Create application state with an explicit cache implementation.
    pub fn with_cache(config: Config, cache: Arc<dyn ResponseCache>) -> AppResult<Self> {
        let salesforce = SalesforceClient::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            cache,
            salesforce,
            started_at: Instant::now(),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
