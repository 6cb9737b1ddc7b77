//! HTTP middleware for security and observability.
//!
//! - **Bearer authentication**: constant-time comparison, fail-closed on
//!   misconfiguration, health endpoints bypassed
//! - **Request ID**: generation and propagation of `X-Request-Id` for
//!   correlating access-log entries
//!
//! ```text
//! Request → Auth → Request ID → Trace → Handler → Response
//!             ↓
//!   401/403/500 before any pipeline work
//! ```

pub mod auth;
pub mod request_id;

pub use auth::BearerAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id};
