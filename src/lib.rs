//! # Unit Proxy
//!
//! A single-endpoint authenticated proxy giving trusted clients controlled,
//! filtered read access to Unit telemetry records in Salesforce, without
//! ever exposing the upstream credential.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Auth → Request ID → Trace → CORS)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Filter Parser & Validator (filters)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Query Builder (soql) → Response Cache (cache)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SalesforceClient (upstream) → Postprocessor (pagination)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Salesforce REST API                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unit_proxy::{AppState, Config, build_router};
//!
//! # fn main() -> Result<(), unit_proxy::AppError> {
//! let config = Config::from_env()?;
//! let state = AppState::new(config)?;
//! let app = build_router(state);
//! // Serve the router...
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Configuration
//!
//! The service fails closed: until `API_KEY` is set to a real value (not the
//! shipped placeholder), `/units` answers 500 `service_misconfigured`.
//!
//! ```bash
//! API_KEY=your-secret-key SF_TOKEN_FILE=/run/secrets/sf-token cargo run
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod routes;
pub mod soql;
pub mod state;
pub mod upstream;

// Re-exports for convenience
pub use cache::{CacheEntry, FileCache, MemoryCache, ResponseCache};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use filters::{FilterSet, RawUnitQuery};
pub use routes::build_router;
pub use state::AppState;
pub use upstream::SalesforceClient;
