//! Core domain types for the NGX portfolio dashboard.
//!
//! - `RefreshPolicy` / `should_refresh`: market-hours auto-refresh gate
//! - `MarketStatus`: typed exchange status
//! - `Portfolio`, `Holding`: worksheet rows coerced into typed holdings
//! - `PricePoint`: historical chart series

pub mod decimal;
pub mod error;
pub mod gate;
pub mod history;
pub mod holding;
pub mod policy;
pub mod status;

pub use decimal::{format_grouped, format_money, parse_numeric, NAIRA};
pub use error::{CoreError, Result};
pub use gate::{should_refresh, should_refresh_now, GateOutcome, RefreshDecision};
pub use history::{parse_chart_data, PricePoint};
pub use holding::{
    format_pl_with_arrow, normalize_pl_percent, Holding, Portfolio, PortfolioTotals, SheetRecord,
};
pub use policy::RefreshPolicy;
pub use status::MarketStatus;
