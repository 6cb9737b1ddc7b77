//! Health and readiness endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check with credential provisioning status
//! - `GET /ready` - Readiness probe
//!
//! Both bypass authentication so load balancers and Kubernetes probes can
//! reach them; neither exposes record data or secret material.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the upstream token file is currently readable and non-empty
    pub token_available: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Health check endpoint.
///
/// Always returns 200 OK; a missing upstream token degrades the reported
/// status but does not fail the probe.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let token_available = state.salesforce.read_token().await.is_ok();

    Json(HealthResponse {
        status: if token_available {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        token_available,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint for Kubernetes probes.
///
/// Returns 200 OK once the service can serve traffic, 503 while the
/// upstream credential is not provisioned.
#[instrument(skip(state))]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if state.salesforce.read_token().await.is_ok() {
        (StatusCode::OK, Json(serde_json::json!({"status": "ready"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "not_ready"})),
        )
    }
}
