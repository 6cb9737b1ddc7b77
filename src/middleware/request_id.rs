//! Request ID middleware for correlating access-log entries.
//!
//! Incoming `X-Request-Id` headers are propagated; requests without one get
//! a fresh UUIDv4. The ID is echoed on the response so clients and any
//! intermediary can correlate log lines for a single request.

use axum::body::Body;
use axum::http::header::HeaderValue;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fallback header value when request ID parsing fails.
static UNKNOWN_REQUEST_ID: HeaderValue = HeaderValue::from_static("unknown");

/// Axum middleware: attach a request ID to the request and response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = extract_or_generate_request_id(&req);

    let header_value = id
        .parse()
        .unwrap_or_else(|_| UNKNOWN_REQUEST_ID.clone());
    req.headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    response
}

/// Extract request ID from headers or generate a new one.
fn extract_or_generate_request_id<B>(req: &Request<B>) -> String {
    if let Some(header_value) = req.headers().get(REQUEST_ID_HEADER)
        && let Ok(value) = header_value.to_str()
        && !value.is_empty()
    {
        return value.to_string();
    }

    Uuid::new_v4().to_string()
}
