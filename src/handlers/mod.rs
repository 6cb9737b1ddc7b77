mod health;
mod units;

pub use health::{HealthResponse, health_check, readiness_check};
pub use units::query_units;
