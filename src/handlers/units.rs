//! The `/units` endpoint: the request pipeline from validated filters to a
//! cached, pagination-augmented Salesforce response.
//!
//! # Pipeline
//!
//! ```text
//! validate filters → read upstream token → cache read
//!     → fresh hit: 200 from cache
//!     → upstream GET
//!         → 2xx: augment pagination, cache write, 200
//!         → failure + cache entry (any age): 200 with cached: true
//!         → failure + no entry: 502 network_error / forwarded upstream status
//! ```
//!
//! The token read deliberately precedes the cache lookup: an unprovisioned
//! credential is a deployment error the operator must see immediately, not
//! something a warm cache should paper over.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::filters::{FilterSet, RawUnitQuery, validate};
use crate::metrics;
use crate::pagination;
use crate::soql;
use crate::state::AppState;
use crate::upstream::QueryTarget;

/// Handle `GET /units`.
#[instrument(skip(state, raw))]
pub async fn query_units(
    State(state): State<AppState>,
    Query(raw): Query<RawUnitQuery>,
) -> AppResult<Json<Value>> {
    let filters = validate(raw, &state.config)?;

    // Upstream credential is read fresh per request, before any cache or
    // network work; failure here is a 400 deployment error
    let token = state.salesforce.read_token().await?;

    let (target, cache_key) = match &filters.cursor {
        Some(cursor) => (
            QueryTarget::Cursor(cursor.clone()),
            soql::cursor_cache_key(cursor),
        ),
        None => {
            let text = filters.to_soql().render();
            let key = soql::query_cache_key(&text);
            (QueryTarget::Soql(text), key)
        }
    };

    let cached = state.cache.get(&cache_key).await?;

    // A fresh hit bypasses upstream entirely
    if let Some(entry) = &cached
        && entry.is_fresh(state.config.cache_ttl)
    {
        match serde_json::from_str::<Value>(&entry.payload) {
            Ok(payload) => {
                metrics::record_request("cache_hit");
                metrics::record_cache_hit();
                access_log(&filters, record_count(&payload), true);
                return Ok(Json(payload));
            }
            Err(e) => {
                // Corrupted entry: treat as a miss and let upstream refresh it
                warn!(key = %cache_key, error = %e, "Unreadable cache entry, refetching");
            }
        }
    }

    let started = Instant::now();
    let fetched = state.salesforce.fetch(&target, &token).await;
    metrics::record_upstream_duration(started.elapsed().as_secs_f64());

    match fetched {
        Ok(response) if response.is_success() => {
            let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
                AppError::Internal(format!("Salesforce returned unparseable JSON: {e}"))
            })?;
            let augmented = pagination::augment(payload, &filters);

            // The augmented payload is what gets cached, so pagination
            // metadata is reproducible from cache
            match serde_json::to_string(&augmented) {
                Ok(serialized) => {
                    if let Err(e) = state.cache.put(&cache_key, &serialized).await {
                        warn!(key = %cache_key, error = %e, "Cache write failed");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize payload for cache"),
            }

            metrics::record_request("ok");
            access_log(&filters, record_count(&augmented), false);
            Ok(Json(augmented))
        }
        Ok(response) => {
            metrics::record_upstream_failure("upstream_status");
            match cached {
                Some(entry) => Ok(serve_fallback(&filters, &entry.payload)),
                None => {
                    metrics::record_request("error");
                    let body = serde_json::from_str(&response.body)
                        .unwrap_or(Value::String(response.body));
                    Err(AppError::UpstreamFailed {
                        status: response.status,
                        body,
                    })
                }
            }
        }
        Err(AppError::Network(reason)) => {
            metrics::record_upstream_failure("network");
            match cached {
                Some(entry) => Ok(serve_fallback(&filters, &entry.payload)),
                None => {
                    metrics::record_request("error");
                    Err(AppError::Network(reason))
                }
            }
        }
        Err(other) => {
            metrics::record_request("error");
            Err(other)
        }
    }
}

/// Serve a cached payload (fresh or stale) as a substitute for a failed
/// upstream call, annotated with `cached: true`.
fn serve_fallback(filters: &FilterSet, payload: &str) -> Json<Value> {
    let annotated = pagination::annotate_cached(payload);
    metrics::record_request("cache_fallback");
    metrics::record_cache_fallback();
    access_log(filters, record_count(&annotated), true);
    Json(annotated)
}

/// Number of records in the page, for the access log.
fn record_count(payload: &Value) -> u64 {
    payload
        .get("records")
        .and_then(Value::as_array)
        .map_or(0, |records| records.len() as u64)
}

/// Structured access-log record, emitted on every response path.
fn access_log(filters: &FilterSet, returned: u64, cache_hit: bool) {
    info!(
        filters = %filters.describe(),
        returned,
        cache_hit,
        timestamp = %Utc::now().to_rfc3339(),
        "Unit query served"
    );
}
