//! Auto-refresh gate.
//!
//! Decides, from wall-clock time and market status, whether the dashboard
//! should keep polling for fresh data. Checks run in a fixed order and the
//! first failing check wins:
//!
//! 1. Weekend in the policy's fixed offset
//! 2. Hour outside `[open, close)`
//! 3. Status was not a string
//! 4. Status contains a closed keyword
//!
//! The gate never fails. Anything that goes wrong while evaluating turns
//! into a "do not refresh" decision carrying the error text, so a broken
//! evaluation can never leave auto-refresh running.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::Serialize;

use crate::error::CoreError;
use crate::policy::RefreshPolicy;
use crate::status::MarketStatus;

/// Why the gate decided the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GateOutcome {
    Weekend,
    OutsideTradingHours,
    /// Upstream status was not a string (raw value attached).
    UnexpectedStatusType(String),
    /// Status matched a closed keyword (raw status attached).
    MarketClosed(String),
    ConditionsMet,
    /// Evaluation failed; carries the error message.
    EvaluationFailed(String),
}

impl GateOutcome {
    /// Short label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weekend => "weekend",
            Self::OutsideTradingHours => "outside_hours",
            Self::UnexpectedStatusType(_) => "unexpected_status",
            Self::MarketClosed(_) => "market_closed",
            Self::ConditionsMet => "active",
            Self::EvaluationFailed(_) => "error",
        }
    }

    pub fn allows_refresh(&self) -> bool {
        matches!(self, Self::ConditionsMet)
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekend => write!(f, "weekend"),
            Self::OutsideTradingHours => write!(f, "outside trading hours"),
            Self::UnexpectedStatusType(raw) => {
                write!(f, "unexpected status type (market status '{raw}')")
            }
            Self::MarketClosed(status) => write!(f, "market '{status}'"),
            Self::ConditionsMet => write!(f, "conditions met"),
            Self::EvaluationFailed(msg) => write!(f, "{msg}"),
        }
    }
}

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshDecision {
    /// Whether the UI should schedule the next refresh.
    pub refresh: bool,
    /// Human-readable reason.
    pub reason: String,
    pub outcome: GateOutcome,
    /// Zone label of the policy offset, e.g. `GMT+1`.
    pub zone: String,
    /// Evaluation instant in the policy offset. `None` if conversion failed.
    pub local_time: Option<DateTime<FixedOffset>>,
}

impl RefreshDecision {
    fn new(outcome: GateOutcome, zone: String, local_time: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            refresh: outcome.allows_refresh(),
            reason: outcome.to_string(),
            outcome,
            zone,
            local_time,
        }
    }

    fn failed(zone: String, err: CoreError) -> Self {
        Self::new(GateOutcome::EvaluationFailed(err.to_string()), zone, None)
    }

    /// Sidebar status line, e.g.
    /// `Auto-refresh (GMT+1 2026-02-09 11:00:00 +01:00): Conditions met. Active.`
    pub fn status_line(&self) -> String {
        let Some(local) = &self.local_time else {
            return self.reason.clone();
        };
        let state = if self.refresh { "Active" } else { "OFF" };
        format!(
            "Auto-refresh ({} {}): {}. {}.",
            self.zone,
            local.format("%Y-%m-%d %H:%M:%S %:z"),
            capitalize(&self.reason),
            state
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Evaluate the gate at a given instant.
#[must_use]
pub fn should_refresh(
    status: &MarketStatus,
    now: DateTime<Utc>,
    policy: &RefreshPolicy,
) -> RefreshDecision {
    let zone = policy.zone_label();
    let offset = match policy.offset() {
        Ok(offset) => offset,
        Err(e) => return RefreshDecision::failed(zone, e),
    };
    let local = now.with_timezone(&offset);
    RefreshDecision::new(classify(status, &local, policy), zone, Some(local))
}

/// Evaluate the gate against the current clock, sampled once.
#[must_use]
pub fn should_refresh_now(status: &MarketStatus, policy: &RefreshPolicy) -> RefreshDecision {
    should_refresh(status, Utc::now(), policy)
}

fn classify(
    status: &MarketStatus,
    local: &DateTime<FixedOffset>,
    policy: &RefreshPolicy,
) -> GateOutcome {
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return GateOutcome::Weekend;
    }

    if !policy.is_trading_hour(local.hour()) {
        return GateOutcome::OutsideTradingHours;
    }

    let status_str = match status {
        MarketStatus::Reported(s) => s,
        MarketStatus::Malformed(raw) => return GateOutcome::UnexpectedStatusType(raw.clone()),
    };

    if policy.matching_closed_keyword(status_str).is_some() {
        return GateOutcome::MarketClosed(status_str.clone());
    }

    GateOutcome::ConditionsMet
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
    }

    /// Policy evaluated directly in UTC so test hours read literally.
    fn utc_policy() -> RefreshPolicy {
        RefreshPolicy {
            gmt_offset_hours: 0,
            ..Default::default()
        }
    }

    fn open() -> MarketStatus {
        MarketStatus::reported("OPEN")
    }

    #[test]
    fn test_weekend_blocks_any_hour_and_status() {
        let policy = utc_policy();
        // 2026-02-07 is Saturday, 2026-02-08 is Sunday
        for day in [7, 8] {
            for hour in 0..24 {
                let decision = should_refresh(&open(), utc(2026, 2, day, hour, 0), &policy);
                assert!(!decision.refresh);
                assert_eq!(decision.outcome, GateOutcome::Weekend);
                assert!(decision.reason.contains("weekend"));
            }
        }
    }

    #[test]
    fn test_outside_hours_blocks_regardless_of_status() {
        let policy = utc_policy();
        // 2026-02-09 is Monday
        for hour in (0..8).chain(18..24) {
            for status in [open(), MarketStatus::reported("ENDOFDAY"), MarketStatus::Malformed("1".into())] {
                let decision = should_refresh(&status, utc(2026, 2, 9, hour, 30), &policy);
                assert!(!decision.refresh);
                assert!(decision.reason.contains("trading hours"));
            }
        }
    }

    #[test]
    fn test_open_boundary_included_close_excluded() {
        let policy = utc_policy();
        assert!(should_refresh(&open(), utc(2026, 2, 9, 8, 0), &policy).refresh);
        assert!(should_refresh(&open(), utc(2026, 2, 9, 17, 59), &policy).refresh);

        let at_close = should_refresh(&open(), utc(2026, 2, 9, 18, 0), &policy);
        assert!(!at_close.refresh);
        assert_eq!(at_close.outcome, GateOutcome::OutsideTradingHours);
    }

    #[test]
    fn test_closed_keywords_block_case_insensitively() {
        let policy = utc_policy();
        let now = utc(2026, 2, 10, 12, 0); // Tuesday
        for raw in ["ENDOFDAY", "endofday", "Market_Closed", "preopen", "Pre_Open session", "closed"] {
            let decision = should_refresh(&MarketStatus::reported(raw), now, &policy);
            assert!(!decision.refresh, "status {raw} should block");
            assert_eq!(decision.outcome, GateOutcome::MarketClosed(raw.to_string()));
            assert!(decision.reason.contains(raw));
        }
    }

    #[test]
    fn test_open_status_in_hours_refreshes() {
        let decision = should_refresh(&open(), utc(2026, 2, 11, 10, 0), &utc_policy());
        assert!(decision.refresh);
        assert_eq!(decision.reason, "conditions met");
        assert_eq!(decision.outcome.label(), "active");
    }

    #[test]
    fn test_fallback_statuses_do_not_match_keywords() {
        let now = utc(2026, 2, 11, 10, 0);
        assert!(should_refresh(&MarketStatus::unknown(), now, &utc_policy()).refresh);
        assert!(should_refresh(&MarketStatus::unavailable(), now, &utc_policy()).refresh);
    }

    #[test]
    fn test_malformed_status_blocks_without_panicking() {
        let status = MarketStatus::Malformed("{\"code\":3}".to_string());
        let decision = should_refresh(&status, utc(2026, 2, 11, 10, 0), &utc_policy());
        assert!(!decision.refresh);
        assert!(decision.reason.contains("unexpected status type"));
        assert_eq!(decision.outcome.label(), "unexpected_status");
    }

    #[test]
    fn test_offset_shifts_weekday_and_hour() {
        let policy = RefreshPolicy::default(); // GMT+1

        // Friday 23:30 UTC is Saturday 00:30 at GMT+1
        let fri_night = should_refresh(&open(), utc(2026, 2, 6, 23, 30), &policy);
        assert_eq!(fri_night.outcome, GateOutcome::Weekend);

        // Sunday 23:30 UTC is Monday 00:30 at GMT+1
        let sun_night = should_refresh(&open(), utc(2026, 2, 8, 23, 30), &policy);
        assert_eq!(sun_night.outcome, GateOutcome::OutsideTradingHours);

        // Monday 07:30 UTC is 08:30 at GMT+1
        assert!(should_refresh(&open(), utc(2026, 2, 9, 7, 30), &policy).refresh);

        // Monday 17:00 UTC is 18:00 at GMT+1
        assert!(!should_refresh(&open(), utc(2026, 2, 9, 17, 0), &policy).refresh);
    }

    #[test]
    fn test_negative_offset() {
        let policy = RefreshPolicy {
            gmt_offset_hours: -5,
            market_open_hour: 9,
            market_close_hour: 16,
            ..Default::default()
        };
        // Tuesday 14:00 UTC is 09:00 at GMT-5
        let decision = should_refresh(&open(), utc(2026, 2, 10, 14, 0), &policy);
        assert!(decision.refresh);
        assert_eq!(decision.zone, "GMT-5");
        // Monday 02:00 UTC is Sunday 21:00 at GMT-5
        let decision = should_refresh(&open(), utc(2026, 2, 9, 2, 0), &policy);
        assert_eq!(decision.outcome, GateOutcome::Weekend);
    }

    #[test]
    fn test_invalid_offset_degrades_to_no_refresh() {
        let policy = RefreshPolicy {
            gmt_offset_hours: 48,
            ..Default::default()
        };
        let decision = should_refresh(&open(), utc(2026, 2, 11, 10, 0), &policy);
        assert!(!decision.refresh);
        assert!(decision.local_time.is_none());
        assert!(decision.reason.contains("invalid GMT offset 48"));
        assert_eq!(decision.status_line(), decision.reason);
    }

    #[test]
    fn test_identical_inputs_give_identical_decisions() {
        let policy = RefreshPolicy::default();
        let now = utc(2026, 2, 11, 10, 0);
        let status = MarketStatus::reported("OPEN");
        assert_eq!(
            should_refresh(&status, now, &policy),
            should_refresh(&status, now, &policy)
        );
    }

    #[test]
    fn test_full_week_only_weekday_hours_refresh() {
        let policy = utc_policy();
        let start = utc(2026, 2, 9, 0, 0); // Monday
        let mut active_hours = 0;
        for h in 0..(7 * 24) {
            if should_refresh(&open(), start + Duration::hours(h), &policy).refresh {
                active_hours += 1;
            }
        }
        assert_eq!(active_hours, 5 * 10);
    }

    #[test]
    fn test_status_line() {
        let decision = should_refresh(&open(), utc(2026, 2, 9, 10, 0), &RefreshPolicy::default());
        assert_eq!(
            decision.status_line(),
            "Auto-refresh (GMT+1 2026-02-09 11:00:00 +01:00): Conditions met. Active."
        );

        let weekend = should_refresh(&open(), utc(2026, 2, 7, 10, 0), &RefreshPolicy::default());
        assert!(weekend.status_line().ends_with("Weekend. OFF."));
    }
}
