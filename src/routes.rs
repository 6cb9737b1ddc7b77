//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Authentication  │ ← 401/403 if invalid, 500 if misconfigured
//! └────────┬─────────┘   (bypassed for /health, /ready)
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{BearerAuth, request_id};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    let mut router = Router::new()
        // Health endpoints (bypass auth)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // The proxy endpoint
        .route("/units", get(handlers::query_units));

    // Middleware is applied bottom to top: auth runs first on every request
    router = router.layer(cors);
    router = router.layer(TraceLayer::new_for_http());
    router = router.layer(axum::middleware::from_fn(request_id));

    let auth_layer = BearerAuth::with_defaults(config.api_key.clone());
    if auth_layer.is_usable() {
        info!("Bearer authentication enabled");
    } else {
        // Fail closed: the layer answers 500 on guarded routes until a real
        // key is configured
        info!("API_KEY unset or placeholder; /units will refuse to serve");
    }
    router = router.layer(auth_layer);

    // Outermost so every body, including auth rejections, carries the
    // charset suffix (every route responds with JSON)
    router = router.layer(SetResponseHeaderLayer::overriding(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    ));

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// Using `*` (any origin) is convenient for development but should be
/// avoided in production. Specify explicit origins instead.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
