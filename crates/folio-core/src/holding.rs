//! Portfolio holdings model.
//!
//! A holding is one row of the `LiveStockData` worksheet. Rows arrive as
//! header -> formatted value maps and are coerced into typed holdings here:
//! numeric cells that do not parse become `None`, P/L % is normalized to
//! percent, and `Total Value` is derived from quantity and current value.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{format_grouped, parse_numeric};

pub const SYMBOL: &str = "Symbol";
pub const QUANTITY: &str = "Quantity";
pub const CURRENT_VALUE: &str = "Current Value";
pub const TOTAL_VALUE: &str = "Total Value";
pub const AVG_PURCHASE_PRICE: &str = "Avg. Purchase Price";
pub const TOTAL_COST: &str = "Total Cost";
pub const PROFIT_LOSS: &str = "Profit/Loss";
pub const PL_PERCENT: &str = "P/L %";
pub const PL_PERCENT_VISUAL: &str = "P/L % Visual";
pub const PERCENT_CHANGE: &str = "Percent Change";
pub const LAST_UPDATED: &str = "Last Updated";
pub const TICKER_ID: &str = "Ticker ID";

/// One spreadsheet row keyed by header.
pub type SheetRecord = BTreeMap<String, String>;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A single position in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Quantity")]
    pub quantity: Option<Decimal>,
    #[serde(rename = "Current Value")]
    pub current_value: Option<Decimal>,
    /// Quantity x current value.
    #[serde(rename = "Total Value")]
    pub total_value: Option<Decimal>,
    #[serde(rename = "Avg. Purchase Price")]
    pub avg_purchase_price: Option<Decimal>,
    #[serde(rename = "Total Cost")]
    pub total_cost: Option<Decimal>,
    #[serde(rename = "Profit/Loss")]
    pub profit_loss: Option<Decimal>,
    /// Profit/loss in percent (12.5 means 12.5%).
    #[serde(rename = "P/L %")]
    pub pl_percent: Option<Decimal>,
    #[serde(rename = "P/L % Visual")]
    pub pl_percent_visual: String,
    #[serde(rename = "Percent Change")]
    pub percent_change: Option<Decimal>,
    #[serde(rename = "Last Updated")]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(rename = "Ticker ID")]
    pub ticker_id: Option<String>,
}

impl Holding {
    /// Build a holding from a raw row. P/L % is taken as-is; fraction
    /// scaling is a column-wide decision made in [`Portfolio::from_records`].
    pub fn from_record(record: &SheetRecord) -> Self {
        let number = |key: &str| record.get(key).and_then(|v| parse_numeric(v));

        let quantity = number(QUANTITY);
        let current_value = number(CURRENT_VALUE);
        // Overflow is treated like a non-numeric cell
        let total_value = match (quantity, current_value) {
            (Some(q), Some(v)) => q.checked_mul(v),
            _ => None,
        };

        Self {
            symbol: record.get(SYMBOL).map(|s| s.trim().to_string()).unwrap_or_default(),
            quantity,
            current_value,
            total_value,
            avg_purchase_price: number(AVG_PURCHASE_PRICE),
            total_cost: number(TOTAL_COST),
            profit_loss: number(PROFIT_LOSS),
            pl_percent: number(PL_PERCENT),
            pl_percent_visual: NOT_AVAILABLE.to_string(),
            percent_change: number(PERCENT_CHANGE),
            last_updated: record.get(LAST_UPDATED).and_then(|v| parse_timestamp(v)),
            ticker_id: record
                .get(TICKER_ID)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

const NOT_AVAILABLE: &str = "N/A";

/// Render P/L % with a direction arrow, e.g. `⬆️ 12.34%`.
pub fn format_pl_with_arrow(value: Option<Decimal>) -> String {
    let Some(v) = value else {
        return NOT_AVAILABLE.to_string();
    };
    let arrow = if v.is_zero() {
        "➡️"
    } else if v.is_sign_positive() {
        "⬆️"
    } else {
        "⬇️"
    };
    format!("{arrow} {}%", format_grouped(v, 2))
}

/// Parse a `Last Updated` cell. Unparseable values become `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Scale a P/L % column stored as fractions (0.1234) to percent (12.34).
///
/// The column is treated as fractions when every present value has
/// magnitude <= 1. An all-missing column is left alone.
pub fn normalize_pl_percent(values: &mut [Option<Decimal>]) {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return;
    }
    if present.all(|v| v.abs() <= Decimal::ONE) {
        let hundred = Decimal::ONE_HUNDRED;
        for v in values.iter_mut().flatten() {
            *v *= hundred;
        }
    }
}

/// Aggregated portfolio figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub total_value: Option<Decimal>,
    pub amount_invested: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
}

/// Sum of the present values. `None` when nothing is present or the sum overflows.
fn sum_present(values: impl Iterator<Item = Option<Decimal>>) -> Option<Decimal> {
    let mut present = values.flatten().peekable();
    present.peek()?;
    present.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// The loaded portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    /// Column headers available for display.
    pub columns: BTreeSet<String>,
    /// User-facing data quality warnings.
    pub warnings: Vec<String>,
}

impl Portfolio {
    /// Build a portfolio from worksheet rows.
    pub fn from_records(records: &[SheetRecord]) -> Self {
        if records.is_empty() {
            return Self {
                warnings: vec!["No data from worksheet. Check the sheet update script.".to_string()],
                ..Default::default()
            };
        }

        let mut columns: BTreeSet<String> =
            records.iter().flat_map(|r| r.keys().cloned()).collect();
        let mut holdings: Vec<Holding> = records.iter().map(Holding::from_record).collect();
        let mut warnings = Vec::new();

        if columns.contains(PL_PERCENT) {
            let mut pl: Vec<Option<Decimal>> = holdings.iter().map(|h| h.pl_percent).collect();
            normalize_pl_percent(&mut pl);
            for (holding, value) in holdings.iter_mut().zip(pl) {
                holding.pl_percent = value;
                holding.pl_percent_visual = format_pl_with_arrow(value);
            }
        } else {
            warnings.push("P/L % column missing, cannot create P/L % Visual.".to_string());
        }

        columns.insert(TOTAL_VALUE.to_string());
        columns.insert(PL_PERCENT_VISUAL.to_string());

        Self {
            holdings,
            columns,
            warnings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn totals(&self) -> PortfolioTotals {
        PortfolioTotals {
            total_value: sum_present(self.holdings.iter().map(|h| h.total_value)),
            amount_invested: sum_present(self.holdings.iter().map(|h| h.total_cost)),
            profit_loss: sum_present(self.holdings.iter().map(|h| h.profit_loss)),
        }
    }

    /// Resolve configured display columns against what the sheet provides.
    /// `P/L %` is shown in its arrow form.
    pub fn display_columns(&self, configured: &[String]) -> Vec<String> {
        configured
            .iter()
            .filter_map(|col| {
                if col == PL_PERCENT && self.columns.contains(PL_PERCENT_VISUAL) {
                    Some(PL_PERCENT_VISUAL.to_string())
                } else if self.columns.contains(col) {
                    Some(col.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Sorted, de-duplicated symbols that have a chart ticker id.
    pub fn chart_symbols(&self, stock_ids: &BTreeMap<String, String>) -> Vec<String> {
        self.holdings
            .iter()
            .filter(|h| stock_ids.contains_key(&h.symbol))
            .map(|h| h.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
