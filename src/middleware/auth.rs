//! Bearer-token authentication middleware (the credential gate).
//!
//! # Security Features
//!
//! - **Constant-time comparison**: Prevents timing attacks on API key validation
//! - **Fail-closed misconfiguration handling**: a missing or placeholder
//!   `API_KEY` makes every guarded route answer 500 rather than letting the
//!   service run behind a publicly known secret
//! - **Selective protection**: Health endpoints bypassed for monitoring
//!
//! The gate runs before any other request work, including before the upstream
//! credential file is touched, so unauthenticated callers learn nothing about
//! resource use or timing of the rest of the pipeline.
//!
//! # Outcomes
//!
//! | Condition | Response |
//! |---|---|
//! | key unset or placeholder | 500 `service_misconfigured` |
//! | no `Authorization` header | 401 `missing_authorization` |
//! | header not `Bearer <token>` | 401 `invalid_authorization` |
//! | token mismatch (constant-time) | 403 `forbidden` |

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::PLACEHOLDER_API_KEY;
use crate::error::AppError;

/// Default paths that bypass authentication.
///
/// Matched by exact string comparison against `request.uri().path()`, so
/// `/health/` (trailing slash) or `/HEALTH` are NOT bypassed. Only paths
/// that expose no record data belong here.
const DEFAULT_BYPASS_PATHS: [&str; 2] = ["/health", "/ready"];

/// Bearer authentication layer.
///
/// Built from the configured `API_KEY`. A `None` or placeholder key does not
/// disable authentication; it makes every guarded route fail closed.
#[derive(Clone)]
pub struct BearerAuth {
    /// Expected API key; `None` when unset or equal to the placeholder
    expected_key: Option<Arc<String>>,
    /// Paths that bypass authentication
    bypass_paths: Arc<Vec<String>>,
}

impl BearerAuth {
    /// Create a new bearer auth layer.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Configured inbound key; the placeholder value is
    ///   treated the same as no key at all (fail closed)
    /// * `bypass_paths` - Paths that bypass authentication
    pub fn new(api_key: Option<String>, bypass_paths: Vec<String>) -> Self {
        let expected_key = api_key
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY)
            .map(Arc::new);

        Self {
            expected_key,
            bypass_paths: Arc::new(bypass_paths),
        }
    }

    /// Create with default bypass paths ("/health", "/ready").
    pub fn with_defaults(api_key: Option<String>) -> Self {
        Self::new(
            api_key,
            DEFAULT_BYPASS_PATHS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }

    /// Whether a usable (non-placeholder) key is configured.
    pub fn is_usable(&self) -> bool {
        self.expected_key.is_some()
    }
}

impl<S> tower::Layer<S> for BearerAuth {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            expected_key: self.expected_key.clone(),
            bypass_paths: self.bypass_paths.clone(),
        }
    }
}

/// Bearer authentication service wrapper.
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    expected_key: Option<Arc<String>>,
    bypass_paths: Arc<Vec<String>>,
}

impl<S> tower::Service<Request<Body>> for BearerAuthService<S>
where
    S: tower::Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let expected_key = self.expected_key.clone();
        let bypass_paths = self.bypass_paths.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Health probes pass through regardless of configuration
            let path = req.uri().path();
            if bypass_paths.iter().any(|p| p == path) {
                debug!(path, "Bypassing auth for health endpoint");
                return inner.call(req).await;
            }

            // Fail closed: no usable key means no service, not open service
            let Some(expected) = expected_key else {
                warn!(
                    path = %req.uri().path(),
                    "Rejecting request: API_KEY is unset or still the placeholder"
                );
                return Ok(
                    AppError::Misconfigured("API_KEY unset or placeholder".to_string())
                        .into_response(),
                );
            };

            match check_bearer(&req, &expected) {
                Ok(()) => inner.call(req).await,
                Err(e) => {
                    warn!(path = %req.uri().path(), error = %e, "Authentication failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}

/// Validate the `Authorization` header against the expected key.
///
/// Header lookup is case-insensitive (HeaderMap normalizes names), so
/// intermediaries rewriting header casing cannot break clients.
fn check_bearer<B>(req: &Request<B>, expected: &str) -> Result<(), AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingAuthorization)?;

    let value = header
        .to_str()
        .map_err(|_| AppError::MalformedAuthorization)?;

    let token = parse_bearer(value).ok_or(AppError::MalformedAuthorization)?;

    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Parse `Bearer <token>` with a case-insensitive scheme and non-empty token.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Perform constant-time comparison of two strings.
///
/// This prevents timing attacks where an attacker could determine
/// the correct API key by measuring response times.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
