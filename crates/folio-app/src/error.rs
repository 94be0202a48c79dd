//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Refresh policy error: {0}")]
    Core(#[from] folio_core::CoreError),

    #[error("Market data error: {0}")]
    MarketData(#[from] folio_market::MarketDataError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] folio_dashboard::DashboardError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] folio_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
