use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Error Taxonomy
///
/// - **Configuration errors** (500): the service itself is misconfigured and
///   refuses to operate (fail-closed)
/// - **Authentication errors** (401/403): absent, malformed, or wrong inbound token
/// - **Validation errors** (400): a filter parameter failed its rule or an
///   illegal parameter combination was supplied
/// - **Upstream-credential errors** (400): the bearer token file is unreadable/empty
/// - **Transport errors** (502): upstream unreachable and no cache fallback exists
/// - **Upstream logical errors**: non-2xx from upstream, forwarded with the
///   upstream's own status code
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        /// Stable machine-readable error code (e.g. `invalid_limit`)
        code: &'static str,
        message: String,
    },

    #[error("Salesforce bearer token is missing or empty")]
    MissingToken,

    #[error("Authorization header is required")]
    MissingAuthorization,

    #[error("Authorization header must be of the form 'Bearer <token>'")]
    MalformedAuthorization,

    #[error("Invalid API key")]
    Forbidden,

    #[error("Service is misconfigured: {0}")]
    Misconfigured(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to reach Salesforce: {0}")]
    Network(String),

    #[error("Salesforce request failed with status {status}")]
    UpstreamFailed {
        /// HTTP status reported by the upstream (0 when unknown)
        status: u16,
        /// Parsed upstream error body when it is JSON, raw text otherwise
        body: Value,
    },

    #[error("Cache storage error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full error details server-side for debugging
        // but only expose sanitized messages to clients
        tracing::error!(error = %self, "Request failed");

        let (status, error_type, message): (StatusCode, &str, String) = match self {
            // Upstream failures forward the upstream's status code and body
            AppError::UpstreamFailed { status, body } => {
                let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let response = ErrorResponse {
                    error: "salesforce_request_failed".to_string(),
                    message: format!("Salesforce request failed with status {status}"),
                    upstream: Some(body),
                };
                return (status_code, axum::Json(response)).into_response();
            }
            AppError::Validation { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::MissingToken => (
                StatusCode::BAD_REQUEST,
                "missing_token",
                "Salesforce bearer token is missing or empty".to_string(),
            ),
            AppError::MissingAuthorization => (
                StatusCode::UNAUTHORIZED,
                "missing_authorization",
                "Authorization header is required".to_string(),
            ),
            AppError::MalformedAuthorization => (
                StatusCode::UNAUTHORIZED,
                "invalid_authorization",
                "Authorization header must be of the form 'Bearer <token>'".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Invalid API key".to_string(),
            ),
            // Never tell clients which configuration value is wrong
            AppError::Misconfigured(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "service_misconfigured",
                "Service is misconfigured. Please contact the operator.".to_string(),
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error. Please contact the operator.".to_string(),
            ),
            AppError::Network(_) => (
                StatusCode::BAD_GATEWAY,
                "network_error",
                "Failed to reach Salesforce and no cached response is available.".to_string(),
            ),
            AppError::Cache(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "cache_error",
                "Cache storage failed. Please try again.".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred. Please contact support if the issue persists."
                    .to_string(),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            upstream: None,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl AppError {
    /// Shorthand for a validation failure with a stable error code.
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            code,
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_bad_request() {
        let response =
            AppError::validation("invalid_limit", "limit must be between 1 and 200").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failure_forwards_status() {
        let response = AppError::UpstreamFailed {
            status: 503,
            body: Value::String("upstream down".to_string()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_failure_unknown_status_defaults_to_502() {
        let response = AppError::UpstreamFailed {
            status: 0,
            body: Value::Null,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_network_error_is_bad_gateway() {
        let response = AppError::Network("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_misconfigured_is_internal_error() {
        let response = AppError::Misconfigured("placeholder API key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
