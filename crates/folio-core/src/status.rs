//! Market status as reported by the exchange.
//!
//! The status string is opaque: the only thing the dashboard does with it is
//! substring matching against the policy's closed keywords. The acquisition
//! boundary turns the upstream payload into a `MarketStatus` so the gate
//! never handles raw JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status shown when the upstream payload has an unexpected shape.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Status shown when the status endpoint could not be reached or parsed.
pub const STATUS_ERROR: &str = "Status API/Parse Error";

/// Market status value handed to the refresh gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MarketStatus {
    /// A string status, e.g. `"OPEN"` or `"ENDOFDAY"`.
    Reported(String),
    /// The status field was present but was not a string.
    /// Carries the raw JSON rendering for display.
    Malformed(String),
}

impl MarketStatus {
    pub fn reported(status: impl Into<String>) -> Self {
        Self::Reported(status.into())
    }

    pub fn unknown() -> Self {
        Self::Reported(UNKNOWN_STATUS.to_string())
    }

    pub fn unavailable() -> Self {
        Self::Reported(STATUS_ERROR.to_string())
    }

    /// Interpret a `MktStatus1` field value.
    pub fn from_field(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some(s) => Self::Reported(s.to_string()),
            None => Self::Malformed(value.to_string()),
        }
    }

    /// The string status, if the upstream value was a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Reported(s) => Some(s),
            Self::Malformed(_) => None,
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported(s) => write!(f, "{s}"),
            Self::Malformed(raw) => write!(f, "{raw}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_string_field() {
        let status = MarketStatus::from_field(&json!("OPEN"));
        assert_eq!(status, MarketStatus::reported("OPEN"));
        assert_eq!(status.as_str(), Some("OPEN"));
    }

    #[test]
    fn test_from_non_string_field() {
        let status = MarketStatus::from_field(&json!(42));
        assert_eq!(status, MarketStatus::Malformed("42".to_string()));
        assert_eq!(status.as_str(), None);
        assert_eq!(status.to_string(), "42");

        let null = MarketStatus::from_field(&serde_json::Value::Null);
        assert_eq!(null.to_string(), "null");
    }

    #[test]
    fn test_fallback_statuses() {
        assert_eq!(MarketStatus::unknown().to_string(), "Unknown");
        assert_eq!(
            MarketStatus::unavailable().to_string(),
            "Status API/Parse Error"
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_string(&MarketStatus::reported("ENDOFDAY")).unwrap();
        assert_eq!(json, r#"{"kind":"reported","value":"ENDOFDAY"}"#);
    }
}
