//! Application configuration.

use std::collections::BTreeMap;
use std::path::Path;

use folio_core::RefreshPolicy;
use folio_dashboard::DashboardConfig;
use folio_market::{DEFAULT_HISTORICAL_BASE_URL, DEFAULT_MARKET_STATUS_URL, DEFAULT_SHEETS_API_BASE};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Environment variable that overrides `sheet.api_key`.
pub const SHEETS_API_KEY_ENV: &str = "FOLIO_SHEETS_API_KEY";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// NGX REST endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgxConfig {
    #[serde(default = "default_market_status_url")]
    pub market_status_url: String,
    /// Prefix; the ticker id is appended.
    #[serde(default = "default_historical_base_url")]
    pub historical_base_url: String,
}

fn default_market_status_url() -> String {
    DEFAULT_MARKET_STATUS_URL.to_string()
}

fn default_historical_base_url() -> String {
    DEFAULT_HISTORICAL_BASE_URL.to_string()
}

impl Default for NgxConfig {
    fn default() -> Self {
        Self {
            market_status_url: default_market_status_url(),
            historical_base_url: default_historical_base_url(),
        }
    }
}

/// Holdings worksheet location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
    /// Spreadsheet id (empty = holdings disabled).
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    /// Prefer FOLIO_SHEETS_API_KEY over storing the key in the file.
    #[serde(default)]
    pub api_key: String,
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_worksheet() -> String {
    "LiveStockData".to_string()
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_base: default_sheets_api_base(),
            spreadsheet_id: String::new(),
            worksheet: default_worksheet(),
            api_key: String::new(),
        }
    }
}

impl SheetConfig {
    pub fn is_configured(&self) -> bool {
        !self.spreadsheet_id.is_empty()
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default log directives; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info,folio=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_stock_ids() -> BTreeMap<String, String> {
    [
        ("NB", "NGNB00000005"),
        ("ACCESSCORP", "NGACCESS0005"),
        ("ZENITHBANK", "NGZENITHBNK9"),
        ("GTCO", "NGGTCO000002"),
        ("FIDELITYBK", "NGFIDELITYB5"),
        ("FIRSTHOLDCO", "NGFBNH000009"),
        ("GUINEAINS", "NGGUINEAINS0"),
        ("HONYFLOUR", "NGHONYFLOUR7"),
        ("MTNN", "NGMTNN000002"),
        ("NSLTECH", "NGNSLTECH006"),
        ("TRANSCORP", "NGTRANSCORP7"),
        ("UNITYBNK", "NGUNITYBANK3"),
    ]
    .iter()
    .map(|(symbol, id)| (symbol.to_string(), id.to_string()))
    .collect()
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Auto-refresh gate policy.
    #[serde(default)]
    pub refresh: RefreshPolicy,
    #[serde(default)]
    pub ngx: NgxConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    /// Symbol -> NGX chart ticker id.
    #[serde(default = "default_stock_ids")]
    pub stock_ids: BTreeMap<String, String>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshPolicy::default(),
            ngx: NgxConfig::default(),
            sheet: SheetConfig::default(),
            stock_ids: default_stock_ids(),
            dashboard: DashboardConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or use defaults if the file does not exist.
    ///
    /// The flag reports whether the file was found. Logging may not be
    /// initialized yet, so the caller reports it.
    pub fn load_or_default(path: &str) -> AppResult<(Self, bool)> {
        if Path::new(path).exists() {
            Ok((Self::from_file(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply environment overrides using `lookup` for variable access.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(SHEETS_API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.sheet.api_key = key;
        }
    }

    /// Validate settings that would otherwise only fail at request time.
    pub fn validate(&self) -> AppResult<()> {
        self.refresh.validate()?;
        self.dashboard.bind_addr()?;

        if self.dashboard.refresh_interval_secs == 0 {
            return Err(AppError::Config(
                "dashboard.refresh_interval_secs must be positive".to_string(),
            ));
        }
        if self.sheet.is_configured() && self.sheet.api_key.is_empty() {
            return Err(AppError::Config(format!(
                "sheet.api_key is empty; set it or {SHEETS_API_KEY_ENV}"
            )));
        }
        if let Some((symbol, _)) = self.stock_ids.iter().find(|(_, id)| id.trim().is_empty()) {
            return Err(AppError::Config(format!("empty ticker id for {symbol}")));
        }
        Ok(())
    }
}
