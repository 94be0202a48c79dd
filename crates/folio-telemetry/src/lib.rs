//! Prometheus metrics and structured logging for the NGX portfolio dashboard.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus metrics for refresh gate decisions, upstream fetches,
//!   cache efficiency and WebSocket clients

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
