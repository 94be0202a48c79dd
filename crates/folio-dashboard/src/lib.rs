//! folio-dashboard - Web dashboard for an NGX stock portfolio.
//!
//! Serves the holdings table, portfolio totals, price history charts and the
//! auto-refresh status. Auto-refresh is only active while the refresh gate is
//! open (weekday, trading hours, market not reported closed).
//!
//! - REST API for the current snapshot, refresh gate and price history
//! - WebSocket pushes: gate state every interval, snapshots while open
//! - Static HTML dashboard UI
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          folio process                         │
//! │                                                                │
//! │  ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐   │
//! │  │  NgxClient   │   │ SheetsClient  │   │  RefreshPolicy   │   │
//! │  └──────┬───────┘   └───────┬───────┘   └────────┬─────────┘   │
//! │         └───────────────────┼────────────────────┘             │
//! │                             ▼                                  │
//! │  ┌──────────────────────────────────────────────────────────┐  │
//! │  │        DashboardState (TTL caches + gate evaluation)      │  │
//! │  └──────────────────────────┬───────────────────────────────┘  │
//! │                             │                                  │
//! │  ┌──────────────────────────┼───────────────────────────────┐  │
//! │  │       axum HTTP Server (port 8080)                        │  │
//! │  │  GET  /                    → Static HTML/JS               │  │
//! │  │  GET  /api/snapshot        → JSON snapshot                │  │
//! │  │  GET  /api/refresh-gate    → refresh decision             │  │
//! │  │  GET  /api/history/{sym}   → price history                │  │
//! │  │  POST /api/cache/clear     → drop cached data             │  │
//! │  │  GET  /metrics             → Prometheus text              │  │
//! │  │  GET  /ws                  → WebSocket upgrade            │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use folio_dashboard::{run_server, DashboardConfig, DashboardState};
//!
//! let state = DashboardState::new(ngx, Some(sheets), policy, stock_ids, config);
//! run_server(state, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

mod broadcast;
mod config;
mod error;
mod server;
mod state;
mod types;

pub use config::{CacheTtlConfig, DashboardConfig};
pub use error::{DashboardError, DashboardResult};
pub use server::{create_router, run_server, AppState};
pub use state::DashboardState;
pub use types::{DashboardMessage, DashboardSnapshot, ErrorBody, HistoryResponse, RefreshView};
