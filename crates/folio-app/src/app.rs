//! Application wiring.
//!
//! Builds the upstream clients from configuration, hands them to the
//! dashboard state and runs the server until Ctrl-C.

use folio_core::{MarketStatus, RefreshDecision};
use folio_dashboard::DashboardState;
use folio_market::{NgxClient, SheetsClient};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    state: DashboardState,
}

impl Application {
    /// Create a new application instance.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let ngx = NgxClient::new(
            config.ngx.market_status_url.clone(),
            config.ngx.historical_base_url.clone(),
        )?;

        let sheets = if config.sheet.is_configured() {
            Some(SheetsClient::new(
                config.sheet.api_base.clone(),
                config.sheet.spreadsheet_id.clone(),
                config.sheet.worksheet.clone(),
                config.sheet.api_key.clone(),
            )?)
        } else {
            warn!("No spreadsheet_id configured, holdings will be empty");
            None
        };

        let state = DashboardState::new(
            ngx,
            sheets,
            config.refresh.clone(),
            config.stock_ids.clone(),
            config.dashboard.clone(),
        );

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Evaluate the refresh gate once against the live market status.
    pub async fn check_gate(&self) -> (MarketStatus, RefreshDecision) {
        self.state.evaluate_gate().await
    }

    /// Run the dashboard until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        info!(
            zone = %self.config.refresh.zone_label(),
            open_hour = self.config.refresh.market_open_hour,
            close_hour = self.config.refresh.market_close_hour,
            refresh_interval_secs = self.config.dashboard.refresh_interval_secs,
            chart_symbols = self.config.stock_ids.len(),
            "Starting application"
        );

        folio_dashboard::run_server(self.state, shutdown_signal()).await?;

        info!("Shutting down");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
