use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════
//  Scalar coercion
// ═══════════════════════════════════════════════════════════════

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy,
/// everything else (including empty arrays and objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric view of a value. Numeric strings parse, booleans map to 0/1.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a value as display text. Strings are unquoted, `null` is `"null"`.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Timestamps
// ═══════════════════════════════════════════════════════════════

/// Parse a Solr timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 strings (`2018-01-24T02:59:10.000Z`), zone-less
/// date-times and dates (taken as UTC), and numbers (already epoch millis).
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
    }
    s.parse::<i64>().ok()
}

/// Epoch milliseconds of a timestamp value, `0` when it cannot be parsed.
pub fn epoch_millis(value: &Value) -> i64 {
    parse_timestamp(value).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════
//  Text/value mapping for editor autocomplete
// ═══════════════════════════════════════════════════════════════

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextValue {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expandable: Option<bool>,
}

impl TextValue {
    pub fn pair(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: Some(text.clone()),
            text,
            expandable: None,
        }
    }

    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: Some(value.into()),
            expandable: None,
        }
    }

    fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            expandable: Some(false),
        }
    }
}

/// Turn a helper-query body into autocomplete entries.
///
/// Understands the collections listing, `facet_counts.facet_fields`
/// (flat `[value, count, value, count, ..]` arrays) and a CSV body whose
/// header line names the fields. Anything else maps to no entries.
pub fn map_to_text_value(data: &Value) -> Vec<TextValue> {
    if let Some(collections) = data.get("collections").and_then(Value::as_array) {
        return collections.iter().map(|c| TextValue::pair(display(c))).collect();
    }

    if let Some(facet_counts) = data.get("facet_counts") {
        let Some(fields) = facet_counts.get("facet_fields").and_then(Value::as_object) else {
            return Vec::new();
        };
        return fields
            .values()
            .filter_map(Value::as_array)
            .flat_map(|counts| counts.iter().step_by(2))
            .map(|term| TextValue::leaf(display(term)))
            .collect();
    }

    if let Some(csv) = data.as_str() {
        let header = csv.lines().next().unwrap_or_default();
        if header.is_empty() {
            return Vec::new();
        }
        return header.split(',').map(TextValue::pair).collect();
    }

    Vec::new()
}
