//! HTTP client for the NGX public REST API.
//!
//! Two endpoints are used:
//! - market status: `[{"MktStatus1": "OPEN", ...}]`
//! - stock chart data: `[[timestamp_ms, price], ...]` per ticker id

use std::time::Duration;

use folio_core::{parse_chart_data, MarketStatus, PricePoint};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{MarketDataError, MarketDataResult};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The status endpoint sits on the page's critical path, so it gets less time.
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Field carrying the status string in the first array element.
const STATUS_FIELD: &str = "MktStatus1";

pub const DEFAULT_MARKET_STATUS_URL: &str =
    "https://doclib.ngxgroup.com/REST/api/statistics/mktstatus";
pub const DEFAULT_HISTORICAL_BASE_URL: &str =
    "https://doclib.ngxgroup.com/REST/api/stockchartdata/";

/// Client for NGX market status and historical prices.
#[derive(Debug, Clone)]
pub struct NgxClient {
    /// HTTP client.
    client: Client,
    market_status_url: String,
    /// Ticker id is appended directly to this prefix.
    historical_base_url: String,
}

impl NgxClient {
    /// Create a new NGX client.
    ///
    /// # Arguments
    /// * `market_status_url` - Full URL of the status endpoint
    /// * `historical_base_url` - Prefix of the chart data endpoint
    ///   (e.g., "https://doclib.ngxgroup.com/REST/api/stockchartdata/")
    pub fn new(
        market_status_url: impl Into<String>,
        historical_base_url: impl Into<String>,
    ) -> MarketDataResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                MarketDataError::HttpClient(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            market_status_url: market_status_url.into(),
            historical_base_url: historical_base_url.into(),
        })
    }

    /// Fetch the market status, mapping every failure to a displayable status.
    ///
    /// Transport or parse failures yield `"Status API/Parse Error"`; an
    /// unexpected payload shape yields `"Unknown"`.
    pub async fn fetch_market_status(&self) -> MarketStatus {
        match self.try_fetch_market_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, url = %self.market_status_url, "Market status fetch failed");
                MarketStatus::unavailable()
            }
        }
    }

    /// Fetch the market status, returning transport and JSON errors.
    pub async fn try_fetch_market_status(&self) -> MarketDataResult<MarketStatus> {
        debug!(url = %self.market_status_url, "Fetching market status");

        let response = self
            .client
            .get(&self.market_status_url)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(|e| MarketDataError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MarketDataError::HttpClient(format!("Failed to read response: {e}")))?;
        let body: serde_json::Value = serde_json::from_str(&text)?;

        let market_status = market_status_from_body(&body);
        debug!(status = %market_status, "Fetched market status");
        Ok(market_status)
    }

    /// Fetch historical prices for an NGX ticker id, sorted by date.
    ///
    /// An empty ticker id returns an empty series without a request.
    pub async fn fetch_historical(&self, ticker_id: &str) -> MarketDataResult<Vec<PricePoint>> {
        if ticker_id.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.historical_base_url, ticker_id);
        info!(url = %url, ticker_id, "Fetching historical chart data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::HttpClient(format!(
                "chart data for {ticker_id} failed: HTTP {status}: {body}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MarketDataError::HttpClient(format!("Failed to read response: {e}")))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let body: serde_json::Value = serde_json::from_str(&text)?;
        let points = parse_chart_data(&body)?;

        info!(ticker_id, points = points.len(), "Fetched historical chart data");
        Ok(points)
    }
}

/// Extract the market status from the status endpoint payload.
///
/// Only a non-empty array whose first element carries `MktStatus1` is
/// recognized; anything else is `"Unknown"`.
pub fn market_status_from_body(body: &serde_json::Value) -> MarketStatus {
    body.as_array()
        .and_then(|entries| entries.first())
        .and_then(|first| first.get(STATUS_FIELD))
        .map(MarketStatus::from_field)
        .unwrap_or_else(MarketStatus::unknown)
}
