//! Historical price series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// One point of a price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    pub price: Decimal,
}

/// Parse the chart endpoint payload: `[[timestamp_ms, price], ...]`.
///
/// Points are returned sorted by date. An empty array yields an empty
/// series; any malformed entry fails the whole payload.
pub fn parse_chart_data(body: &serde_json::Value) -> Result<Vec<PricePoint>> {
    let entries = match body {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(entries) => entries,
        other => {
            return Err(CoreError::InvalidHistory(format!(
                "expected array, got {other}"
            )))
        }
    };

    let mut points = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| match parse_point(entry) {
            Some(point) => point,
            None => Err(CoreError::InvalidHistory(format!(
                "entry {idx} is not [timestamp_ms, price]: {entry}"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    points.sort_by_key(|p| p.date);
    Ok(points)
}

fn parse_point(entry: &serde_json::Value) -> Option<Result<PricePoint>> {
    let pair = entry.as_array()?;
    let (ts, price) = match pair.as_slice() {
        [ts, price, ..] => (ts, price),
        _ => return None,
    };
    let date = DateTime::<Utc>::from_timestamp_millis(ts.as_f64()? as i64)?;
    let price = match price {
        serde_json::Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(CoreError::from),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().map_err(CoreError::from),
        _ => return None,
    };
    Some(price.map(|price| PricePoint { date, price }))
}
