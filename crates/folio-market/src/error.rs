//! Market data error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Price history error: {0}")]
    History(#[from] folio_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MarketDataResult<T> = Result<T, MarketDataError>;
