//! Dashboard state management.
//!
//! DashboardState owns the upstream clients, the refresh policy and the TTL
//! caches. Every snapshot re-evaluates the refresh gate from scratch; only
//! upstream data is cached.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use folio_core::{
    format_money, should_refresh_now, GateOutcome, MarketStatus, Portfolio, PricePoint,
    RefreshDecision, RefreshPolicy,
};
use folio_market::{MarketDataError, MarketDataResult, NgxClient, SheetsClient, TtlCache};
use folio_telemetry::Metrics;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::types::{DashboardSnapshot, HistoryResponse, RefreshView};

const PORTFOLIO_CACHE: &str = "portfolio";
const STATUS_CACHE: &str = "market_status";
const HISTORY_CACHE: &str = "history";

/// Dashboard state shared by all handlers and the broadcaster.
#[derive(Clone)]
pub struct DashboardState {
    /// NGX market status and chart data.
    ngx: NgxClient,
    /// Holdings worksheet (None when no spreadsheet is configured).
    sheets: Option<SheetsClient>,
    policy: Arc<RefreshPolicy>,
    /// Symbol -> NGX chart ticker id.
    stock_ids: Arc<BTreeMap<String, String>>,
    config: Arc<DashboardConfig>,
    portfolio_cache: Arc<TtlCache<(), Portfolio>>,
    status_cache: Arc<TtlCache<(), MarketStatus>>,
    history_cache: Arc<TtlCache<String, Vec<PricePoint>>>,
    /// Last gate outcome label, for transition logging.
    last_outcome: Arc<RwLock<Option<&'static str>>>,
}

impl DashboardState {
    pub fn new(
        ngx: NgxClient,
        sheets: Option<SheetsClient>,
        policy: RefreshPolicy,
        stock_ids: BTreeMap<String, String>,
        config: DashboardConfig,
    ) -> Self {
        let ttl = &config.cache;
        Self {
            ngx,
            sheets,
            policy: Arc::new(policy),
            stock_ids: Arc::new(stock_ids),
            portfolio_cache: Arc::new(TtlCache::new(Duration::from_secs(ttl.portfolio_secs))),
            status_cache: Arc::new(TtlCache::new(Duration::from_secs(ttl.market_status_secs))),
            history_cache: Arc::new(TtlCache::new(Duration::from_secs(ttl.history_secs))),
            config: Arc::new(config),
            last_outcome: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn stock_ids(&self) -> &BTreeMap<String, String> {
        &self.stock_ids
    }

    /// Market status, cached for the status TTL.
    ///
    /// Fetch failures are cached as the fallback status too, so a down
    /// endpoint is not hammered on every page load.
    pub async fn market_status(&self) -> MarketStatus {
        if let Some(status) = self.status_cache.get(&()) {
            Metrics::cache_hit(STATUS_CACHE);
            return status;
        }
        Metrics::cache_miss(STATUS_CACHE);

        let started = Instant::now();
        let status = self.ngx.fetch_market_status().await;
        let ok = status != MarketStatus::unavailable();
        Metrics::upstream_request(STATUS_CACHE, ok, elapsed_ms(started));

        self.status_cache.insert((), status.clone());
        status
    }

    /// Evaluate the refresh gate against the current market status.
    pub async fn evaluate_gate(&self) -> (MarketStatus, RefreshDecision) {
        let status = self.market_status().await;
        let decision = should_refresh_now(&status, &self.policy);
        self.record_decision(&decision);
        (status, decision)
    }

    fn record_decision(&self, decision: &RefreshDecision) {
        let label = decision.outcome.label();
        Metrics::refresh_decision(label);

        let previous = self.last_outcome.write().replace(label);
        if previous != Some(label) {
            match &decision.outcome {
                GateOutcome::EvaluationFailed(msg) => {
                    warn!(error = %msg, "Refresh gate evaluation failed, auto-refresh off")
                }
                _ => info!(
                    outcome = label,
                    refresh = decision.refresh,
                    reason = %decision.reason,
                    previous = ?previous,
                    "Auto-refresh state changed"
                ),
            }
        } else {
            debug!(outcome = label, reason = %decision.reason, "Refresh gate evaluated");
        }
    }

    /// Holdings from the worksheet, cached for the portfolio TTL.
    /// Failures are not cached.
    pub async fn portfolio(&self) -> MarketDataResult<(Portfolio, chrono::DateTime<Utc>)> {
        if let Some(entry) = self.portfolio_cache.get_entry(&()) {
            Metrics::cache_hit(PORTFOLIO_CACHE);
            return Ok((entry.value, entry.fetched_at));
        }
        Metrics::cache_miss(PORTFOLIO_CACHE);

        let sheets = self
            .sheets
            .as_ref()
            .ok_or_else(|| MarketDataError::NotConfigured("spreadsheet_id".to_string()))?;

        let started = Instant::now();
        let result = sheets.load_portfolio().await;
        Metrics::upstream_request("sheet", result.is_ok(), elapsed_ms(started));

        let portfolio = result?;
        let total_value = portfolio
            .totals()
            .total_value
            .map(|v| format_money(v, &self.config.currency_symbol))
            .unwrap_or_else(|| "N/A".to_string());
        info!(
            holdings = portfolio.holdings.len(),
            total_value = %total_value,
            "Loaded portfolio from worksheet"
        );
        self.portfolio_cache.insert((), portfolio.clone());
        Ok((portfolio, Utc::now()))
    }

    /// Collect a full snapshot of the current state.
    pub async fn collect_snapshot(&self) -> DashboardSnapshot {
        let (status, decision) = self.evaluate_gate().await;
        self.snapshot_for(status, decision).await
    }

    /// Build a snapshot around an already evaluated gate decision.
    pub async fn snapshot_for(
        &self,
        status: MarketStatus,
        decision: RefreshDecision,
    ) -> DashboardSnapshot {
        let (portfolio, fetched_at) = match self.portfolio().await {
            Ok((portfolio, fetched_at)) => (portfolio, Some(fetched_at)),
            Err(e) => {
                warn!(error = %e, "Could not load live data");
                let portfolio = Portfolio {
                    warnings: vec![format!(
                        "Could not load live data ({e}). Check the spreadsheet connection."
                    )],
                    ..Default::default()
                };
                (portfolio, None)
            }
        };

        DashboardSnapshot {
            timestamp_ms: Utc::now().timestamp_millis(),
            market_status: status.to_string(),
            refresh: RefreshView::new(decision, self.config.refresh_interval_secs),
            currency_symbol: self.config.currency_symbol.clone(),
            columns: portfolio.display_columns(&self.config.columns),
            totals: portfolio.totals(),
            chart_symbols: portfolio.chart_symbols(&self.stock_ids),
            data_fetched_at_ms: fetched_at.map(|t| t.timestamp_millis()),
            warnings: portfolio.warnings,
            holdings: portfolio.holdings,
        }
    }

    /// Refresh gate view for the sidebar.
    pub async fn refresh_view(&self) -> RefreshView {
        let (_, decision) = self.evaluate_gate().await;
        RefreshView::new(decision, self.config.refresh_interval_secs)
    }

    /// Historical prices for a symbol, cached per ticker id.
    pub async fn history(&self, symbol: &str) -> DashboardResult<HistoryResponse> {
        let ticker_id = self
            .stock_ids
            .get(symbol)
            .ok_or_else(|| DashboardError::UnknownSymbol(symbol.to_string()))?
            .clone();

        let points = match self.history_cache.get(&ticker_id) {
            Some(points) => {
                Metrics::cache_hit(HISTORY_CACHE);
                points
            }
            None => {
                Metrics::cache_miss(HISTORY_CACHE);
                let started = Instant::now();
                let result = self.ngx.fetch_historical(&ticker_id).await;
                Metrics::upstream_request(HISTORY_CACHE, result.is_ok(), elapsed_ms(started));
                let points = result?;
                self.history_cache.insert(ticker_id.clone(), points.clone());
                points
            }
        };

        Ok(HistoryResponse {
            symbol: symbol.to_string(),
            ticker_id,
            points,
        })
    }

    /// Drop all cached upstream data.
    pub fn clear_caches(&self, trigger: &str) {
        self.portfolio_cache.clear();
        self.status_cache.clear();
        self.history_cache.clear();
        Metrics::cache_cleared(trigger);
        info!(trigger, "Data caches cleared");
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, status: MarketStatus, portfolio: Portfolio) {
        self.status_cache.insert((), status);
        self.portfolio_cache.insert((), portfolio);
    }

    #[cfg(test)]
    pub(crate) fn seed_history(&self, ticker_id: &str, points: Vec<PricePoint>) {
        self.history_cache.insert(ticker_id.to_string(), points);
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl std::fmt::Debug for DashboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardState")
            .field("policy", &self.policy)
            .field("sheets_configured", &self.sheets.is_some())
            .field("chart_symbols", &self.stock_ids.len())
            .field("cached_histories", &self.history_cache.len())
            .finish()
    }
}
