//! Upstream data sources for the NGX portfolio dashboard.
//!
//! - `NgxClient`: market status and historical chart data from the NGX REST API
//! - `SheetsClient`: holdings rows from the portfolio spreadsheet
//! - `TtlCache`: per-key time-to-live cache shared by the dashboard

pub mod cache;
pub mod error;
pub mod ngx_client;
pub mod sheets;

pub use cache::{CacheEntry, TtlCache};
pub use error::{MarketDataError, MarketDataResult};
pub use ngx_client::{
    market_status_from_body, NgxClient, DEFAULT_HISTORICAL_BASE_URL, DEFAULT_MARKET_STATUS_URL,
};
pub use sheets::{records_from_values, SheetsClient, DEFAULT_SHEETS_API_BASE};
