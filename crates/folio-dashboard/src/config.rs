//! Dashboard configuration.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};

/// Cache time-to-live settings (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    /// Worksheet holdings.
    #[serde(default = "default_portfolio_ttl_secs")]
    pub portfolio_secs: u64,
    /// Market status.
    #[serde(default = "default_market_status_ttl_secs")]
    pub market_status_secs: u64,
    /// Historical chart data, per ticker.
    #[serde(default = "default_history_ttl_secs")]
    pub history_secs: u64,
}

fn default_portfolio_ttl_secs() -> u64 {
    300
}

fn default_market_status_ttl_secs() -> u64 {
    60
}

fn default_history_ttl_secs() -> u64 {
    300
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            portfolio_secs: default_portfolio_ttl_secs(),
            market_status_secs: default_market_status_ttl_secs(),
            history_secs: default_history_ttl_secs(),
        }
    }
}

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between auto-refreshes while the refresh gate is open.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Maximum concurrent WebSocket connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Basic auth username (empty = disabled).
    #[serde(default)]
    pub username: String,
    /// Basic auth password (empty = disabled).
    #[serde(default)]
    pub password: String,
    /// Currency symbol for money columns.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Holdings table columns, in display order.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    #[serde(default)]
    pub cache: CacheTtlConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_refresh_interval_secs() -> u64 {
    120
}

fn default_max_connections() -> usize {
    10
}

fn default_currency_symbol() -> String {
    folio_core::NAIRA.to_string()
}

fn default_columns() -> Vec<String> {
    [
        "Symbol",
        "Quantity",
        "Current Value",
        "Total Value",
        "Avg. Purchase Price",
        "Total Cost",
        "Profit/Loss",
        "P/L %",
        "Percent Change",
        "Last Updated",
        "Ticker ID",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            refresh_interval_secs: default_refresh_interval_secs(),
            max_connections: default_max_connections(),
            username: String::new(),
            password: String::new(),
            currency_symbol: default_currency_symbol(),
            columns: default_columns(),
            cache: CacheTtlConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Check if basic auth is enabled.
    pub fn auth_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> DashboardResult<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| DashboardError::Config(format!("invalid host '{}': {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
