//! Auto-refresh policy.
//!
//! The policy is an immutable value handed to the refresh gate on every
//! evaluation. Nothing here is process-global, so tests can inject any
//! combination of offset, trading window and closed keywords.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const SECONDS_PER_HOUR: i32 = 3600;

/// Policy thresholds for the refresh gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    /// Fixed offset from GMT in hours used to compute local market time.
    /// Constant offset, no daylight-saving adjustment.
    #[serde(default = "default_gmt_offset_hours")]
    pub gmt_offset_hours: i32,
    /// First trading hour (inclusive).
    #[serde(default = "default_market_open_hour")]
    pub market_open_hour: u32,
    /// Close hour (exclusive). Refreshing stops at the close boundary.
    #[serde(default = "default_market_close_hour")]
    pub market_close_hour: u32,
    /// Case-insensitive substrings that mark a status as "not trading".
    #[serde(default = "default_closed_keywords")]
    pub closed_keywords: Vec<String>,
}

fn default_gmt_offset_hours() -> i32 {
    1
}

fn default_market_open_hour() -> u32 {
    8
}

fn default_market_close_hour() -> u32 {
    18
}

fn default_closed_keywords() -> Vec<String> {
    ["ENDOFDAY", "CLOSED", "MARKET_CLOSED", "PREOPEN", "PRE_OPEN"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            gmt_offset_hours: default_gmt_offset_hours(),
            market_open_hour: default_market_open_hour(),
            market_close_hour: default_market_close_hour(),
            closed_keywords: default_closed_keywords(),
        }
    }
}

impl RefreshPolicy {
    /// Check configured bounds.
    ///
    /// Called once at config load. The gate does not depend on it: an
    /// out-of-range offset still degrades to "do not refresh".
    pub fn validate(&self) -> Result<()> {
        if self.market_open_hour >= 24 {
            return Err(CoreError::InvalidPolicy(format!(
                "market_open_hour must be in [0, 24), got {}",
                self.market_open_hour
            )));
        }
        if self.market_close_hour >= 24 {
            return Err(CoreError::InvalidPolicy(format!(
                "market_close_hour must be in [0, 24), got {}",
                self.market_close_hour
            )));
        }
        self.offset()?;
        Ok(())
    }

    /// The configured fixed offset.
    pub fn offset(&self) -> Result<FixedOffset> {
        self.gmt_offset_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                CoreError::GateEvaluation(format!(
                    "invalid GMT offset {} hours",
                    self.gmt_offset_hours
                ))
            })
    }

    /// Whether `hour` falls in the half-open trading window.
    #[inline]
    pub fn is_trading_hour(&self, hour: u32) -> bool {
        (self.market_open_hour..self.market_close_hour).contains(&hour)
    }

    /// Return the first closed keyword contained in `status`, if any.
    pub fn matching_closed_keyword(&self, status: &str) -> Option<&str> {
        let status_upper = status.to_uppercase();
        self.closed_keywords
            .iter()
            .find(|keyword| status_upper.contains(&keyword.to_uppercase()))
            .map(String::as_str)
    }

    /// Human-readable zone label, e.g. `GMT+1`.
    pub fn zone_label(&self) -> String {
        format!("GMT{:+}", self.gmt_offset_hours)
    }
}
