//! Dashboard error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No chart ticker id configured for {0}")]
    UnknownSymbol(String),

    #[error("Market data error: {0}")]
    MarketData(#[from] folio_market::MarketDataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
