//! Decimal coercion and display helpers.
//!
//! Spreadsheet cells arrive as formatted strings (`"₦1,234.50"`, `"12.3%"`).
//! Money stays in `rust_decimal` end to end so totals never pick up
//! floating-point noise.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol used by the NGX portfolio sheet.
pub const NAIRA: &str = "₦";

/// Coerce a formatted cell into a decimal.
///
/// Strips surrounding whitespace, thousands separators, the naira sign and
/// a trailing percent sign. Returns `None` for anything that is still not a
/// number, including empty cells.
pub fn parse_numeric(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .replace(NAIRA, "")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Format with thousands separators and a fixed number of decimals,
/// e.g. `1234567.891` -> `1,234,567.89`.
pub fn format_grouped(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", decimals as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Format an amount with the currency symbol, e.g. `₦1,234.50`.
pub fn format_money(value: Decimal, symbol: &str) -> String {
    format!("{symbol}{}", format_grouped(value, 2))
}
