//! Spreadsheet holdings source.
//!
//! Reads the holdings worksheet through the spreadsheet values API using an
//! API key, so the sheet must be shared for link access. The first row is
//! the header; every following row becomes a header -> formatted value map.

use std::time::Duration;

use folio_core::{Portfolio, SheetRecord};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{MarketDataError, MarketDataResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Values API response body.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Client for one worksheet of one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        api_key: impl Into<String>,
    ) -> MarketDataResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                MarketDataError::HttpClient(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            api_key: api_key.into(),
        })
    }

    /// `{api_base}/v4/spreadsheets/{id}/values/{worksheet}` with encoded segments.
    fn values_url(&self) -> MarketDataResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| MarketDataError::InvalidUrl(format!("{}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| MarketDataError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.worksheet.as_str(),
            ]);
        Ok(url)
    }

    /// Fetch all worksheet rows as records, using formatted cell values.
    pub async fn fetch_records(&self) -> MarketDataResult<Vec<SheetRecord>> {
        let url = self.values_url()?;
        info!(
            spreadsheet = %self.spreadsheet_id,
            worksheet = %self.worksheet,
            "Fetching worksheet values"
        );

        let response = self
            .client
            .get(url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => {
                return Err(MarketDataError::SpreadsheetNotFound(
                    self.spreadsheet_id.clone(),
                ))
            }
            // The values API answers 400 "Unable to parse range" for unknown tabs.
            StatusCode::BAD_REQUEST => {
                return Err(MarketDataError::WorksheetNotFound(self.worksheet.clone()))
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(MarketDataError::HttpClient(format!("HTTP {s}: {body}")));
            }
            _ => {}
        }

        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(format!("Failed to parse values response: {e}")))?;

        let records = records_from_values(&body.values);
        debug!(rows = records.len(), "Worksheet values converted to records");
        Ok(records)
    }

    /// Fetch the worksheet and build the portfolio.
    pub async fn load_portfolio(&self) -> MarketDataResult<Portfolio> {
        let records = self.fetch_records().await?;
        let portfolio = Portfolio::from_records(&records);
        for warning in &portfolio.warnings {
            warn!(worksheet = %self.worksheet, warning = %warning, "Portfolio data warning");
        }
        Ok(portfolio)
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert a values grid (header row first) into records.
///
/// Short rows are padded with empty strings, cells beyond the header are
/// dropped, and rows with no content are skipped.
pub fn records_from_values(values: &[Vec<serde_json::Value>]) -> Vec<SheetRecord> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| cell_text(h).trim().to_string()).collect();

    rows.iter()
        .filter(|row| row.iter().any(|cell| !cell_text(cell).trim().is_empty()))
        .map(|row| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(idx, name)| {
                    let value = row.get(idx).map(cell_text).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}
