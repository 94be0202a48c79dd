//! Dashboard API types.
//!
//! These types are used for JSON serialization in REST and WebSocket APIs.

use folio_core::{Holding, PortfolioTotals, PricePoint, RefreshDecision};
use serde::Serialize;

/// Refresh gate state as shown in the sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshView {
    #[serde(flatten)]
    pub decision: RefreshDecision,
    /// Rendered sidebar line.
    pub status_line: String,
    /// Delay before the next refresh while `refresh` is true.
    pub interval_secs: u64,
}

impl RefreshView {
    pub fn new(decision: RefreshDecision, interval_secs: u64) -> Self {
        Self {
            status_line: decision.status_line(),
            decision,
            interval_secs,
        }
    }
}

/// Full dashboard state snapshot (sent on initial connection and via REST).
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Timestamp when snapshot was taken (Unix milliseconds).
    pub timestamp_ms: i64,
    /// Market status text.
    pub market_status: String,
    pub refresh: RefreshView,
    pub currency_symbol: String,
    /// Holdings columns to render, in order.
    pub columns: Vec<String>,
    pub holdings: Vec<Holding>,
    pub totals: PortfolioTotals,
    /// Symbols with a chart ticker id, sorted.
    pub chart_symbols: Vec<String>,
    /// When the holdings were fetched from the sheet (Unix milliseconds).
    pub data_fetched_at_ms: Option<i64>,
    /// Data quality and loading warnings.
    pub warnings: Vec<String>,
}

/// Historical chart response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub ticker_id: String,
    pub points: Vec<PricePoint>,
}

/// Error body for JSON endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// WebSocket message types (tagged enum for type safety).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Full snapshot (sent on connect).
    Snapshot(DashboardSnapshot),
    /// Fresh snapshot pushed while the refresh gate is open.
    Update(DashboardSnapshot),
    /// Gate evaluation from the broadcaster tick.
    RefreshGate {
        timestamp_ms: i64,
        refresh: RefreshView,
    },
    /// Caches were cleared; clients should reload.
    CacheCleared { timestamp_ms: i64 },
}
