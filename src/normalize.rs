//! Maps provider specific quote bodies onto [`NormalizedQuote`].

use crate::core::{NormalizedQuote, ProviderId};
use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};

/// Source field names for each member of a [`NormalizedQuote`].
struct FieldMap {
    open: &'static str,
    high: &'static str,
    low: &'static str,
    close: &'static str,
    previous_close: Option<&'static str>,
}

const ALPHAVANTAGE_FIELDS: FieldMap = FieldMap {
    open: "02. open",
    high: "03. high",
    low: "04. low",
    close: "05. price",
    previous_close: Some("08. previous close"),
};

// Aggregates carry no previous close.
const POLYGON_AGG_FIELDS: FieldMap = FieldMap {
    open: "o",
    high: "h",
    low: "l",
    close: "c",
    previous_close: None,
};

const POLYGON_OPEN_CLOSE_FIELDS: FieldMap = FieldMap {
    open: "open",
    high: "high",
    low: "low",
    close: "close",
    previous_close: None,
};

const FINNHUB_FIELDS: FieldMap = FieldMap {
    open: "o",
    high: "h",
    low: "l",
    close: "c",
    previous_close: Some("pc"),
};

const FMP_FIELDS: FieldMap = FieldMap {
    open: "open",
    high: "dayHigh",
    low: "dayLow",
    close: "price",
    previous_close: Some("previousClose"),
};

const EODHD_FIELDS: FieldMap = FieldMap {
    open: "open",
    high: "high",
    low: "low",
    close: "close",
    previous_close: Some("previousClose"),
};

/// Normalizes a raw body returned by `provider`.
///
/// Missing fields are zero. Shapes that cannot hold a quote, such as an empty
/// result array, are errors.
pub fn normalize(provider: ProviderId, raw: &Value) -> Result<NormalizedQuote> {
    let normalized = match provider {
        ProviderId::AlphaVantage => normalize_alphavantage(raw),
        ProviderId::PolygonIo => normalize_polygon(raw),
        ProviderId::Finnhub => as_object(raw).and_then(|body| extract(body, &FINNHUB_FIELDS)),
        ProviderId::Fmp => normalize_fmp(raw),
        ProviderId::Eodhd => as_object(raw).and_then(|body| extract(body, &EODHD_FIELDS)),
    };
    normalized.with_context(|| format!("Failed to normalize {} response", provider.display_name()))
}

fn normalize_alphavantage(raw: &Value) -> Result<NormalizedQuote> {
    let body = as_object(raw)?;
    match body.get("Global Quote") {
        None | Some(Value::Null) => Ok(NormalizedQuote::default()),
        Some(payload) => extract(as_object(payload)?, &ALPHAVANTAGE_FIELDS),
    }
}

fn normalize_polygon(raw: &Value) -> Result<NormalizedQuote> {
    let body = as_object(raw)?;
    if let Some(results) = body.get("results") {
        return extract(as_object(first_element(results)?)?, &POLYGON_AGG_FIELDS);
    }
    // An unknown ticker on the aggregate endpoint omits `results` entirely.
    let has_open_close = ["from", "open", "high", "low", "close"]
        .iter()
        .any(|key| body.contains_key(*key));
    if !has_open_close {
        bail!("No quote returned");
    }
    extract(body, &POLYGON_OPEN_CLOSE_FIELDS)
}

fn normalize_fmp(raw: &Value) -> Result<NormalizedQuote> {
    extract(as_object(first_element(raw)?)?, &FMP_FIELDS)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| anyhow!("Expected a JSON object, got {}", kind(value)))
}

fn first_element(value: &Value) -> Result<&Value> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("Expected a JSON array, got {}", kind(value)))?;
    items.first().ok_or_else(|| anyhow!("No quote returned"))
}

fn extract(payload: &Map<String, Value>, fields: &FieldMap) -> Result<NormalizedQuote> {
    Ok(NormalizedQuote {
        open: number(payload, fields.open)?,
        high: number(payload, fields.high)?,
        low: number(payload, fields.low)?,
        close: number(payload, fields.close)?,
        previous_close: match fields.previous_close {
            Some(key) => number(payload, key)?,
            None => 0.0,
        },
    })
}

/// Reads `key` as a number. Absent, null, empty and `"NA"` all read as zero.
fn number(payload: &Map<String, Value>, key: &str) -> Result<f64> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| anyhow!("Field '{}' is out of range", key)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("na") {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| anyhow!("Field '{}' is not numeric: {:?}", key, s))
        }
        Some(other) => bail!("Field '{}' is not numeric: {}", key, kind(other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
