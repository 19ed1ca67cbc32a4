use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════
//  OutputFormat
// ═══════════════════════════════════════════════════════════════

/// Requested output shape. Unknown values fall back to `Chart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Single,
    #[default]
    #[serde(other)]
    Chart,
}

// ═══════════════════════════════════════════════════════════════
//  TargetSpec — one requested series definition
// ═══════════════════════════════════════════════════════════════

/// A dashboard target as sent by the query editor.
///
/// Field names on the wire follow the editor's historical model
/// (`target` is the filter expression, `time` the time field, ...).
/// Every field is optional on the wire; missing and `null` values take
/// their defaults, and numbers are accepted where text is expected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetSpec {
    #[serde(deserialize_with = "text")]
    pub collection: String,
    #[serde(rename = "time", deserialize_with = "text")]
    pub time_field: String,
    /// Comma-joined field list appended to the time field in `fl`.
    #[serde(rename = "fields", deserialize_with = "text")]
    pub fields_to_select: String,
    /// User query; `{a,b}` groups are rewritten to `(a OR b)`.
    #[serde(rename = "target", deserialize_with = "text")]
    pub filter_expression: String,
    /// `&`-joined `key=value` overrides applied after the built parameters.
    #[serde(deserialize_with = "text")]
    pub raw_params: String,
    #[serde(rename = "rows", deserialize_with = "opt_text")]
    pub row_limit: Option<String>,
    #[serde(rename = "start", deserialize_with = "opt_text")]
    pub start_offset: Option<String>,
    #[serde(rename = "sort", deserialize_with = "opt_text")]
    pub sort_field: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub sort_order: Option<String>,
    #[serde(rename = "groupEnabled", deserialize_with = "flag")]
    pub grouping_enabled: bool,
    #[serde(deserialize_with = "text")]
    pub group_by_field: String,
    #[serde(deserialize_with = "opt_text")]
    pub group_limit: Option<String>,
    #[serde(deserialize_with = "output_format")]
    pub output_format: OutputFormat,
    #[serde(rename = "solrCloudMode", deserialize_with = "flag")]
    pub cloud_mode_override: bool,
    #[serde(rename = "hide", deserialize_with = "flag")]
    pub hidden: bool,
}

/// Why a target was excluded from compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    MissingFilter,
    MissingCollection,
    MissingTimeField,
    MissingGroupByField,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden"),
            Self::MissingFilter => write!(f, "no filter expression"),
            Self::MissingCollection => write!(f, "no collection"),
            Self::MissingTimeField => write!(f, "no time field"),
            Self::MissingGroupByField => write!(f, "grouping enabled without group-by field"),
        }
    }
}

impl TargetSpec {
    pub fn new(
        collection: impl Into<String>,
        time_field: impl Into<String>,
        filter_expression: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            time_field: time_field.into(),
            filter_expression: filter_expression.into(),
            ..Self::default()
        }
    }

    /// The reason this target must not be queried, if any.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if self.hidden {
            Some(SkipReason::Hidden)
        } else if self.filter_expression.is_empty() {
            Some(SkipReason::MissingFilter)
        } else if self.collection.is_empty() {
            Some(SkipReason::MissingCollection)
        } else if self.time_field.is_empty() {
            Some(SkipReason::MissingTimeField)
        } else if self.grouping_enabled && self.group_by_field.is_empty() {
            Some(SkipReason::MissingGroupByField)
        } else {
            None
        }
    }

    pub fn is_queryable(&self) -> bool {
        self.skip_reason().is_none()
    }
}

// ═══════════════════════════════════════════════════════════════
//  TimeRange
// ═══════════════════════════════════════════════════════════════

/// Inclusive query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn from_literal(&self) -> String {
        solr_timestamp(&self.from)
    }

    pub fn to_literal(&self) -> String {
        solr_timestamp(&self.to)
    }

    /// `<field>:[<from> TO <to>]`; both bounds are inclusive in Solr's range syntax.
    pub fn filter(&self, field: &str) -> String {
        format!("{field}:[{} TO {}]", self.from_literal(), self.to_literal())
    }
}

/// Solr date literal: ISO-8601, millisecond precision, `Z` suffix.
pub fn solr_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ═══════════════════════════════════════════════════════════════
//  Lenient field decoders
// ═══════════════════════════════════════════════════════════════

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_text(deserializer).map(Option::unwrap_or_default)
}

fn output_format<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match opt_text(deserializer)?.as_deref() {
        Some("table") => OutputFormat::Table,
        Some("single") => OutputFormat::Single,
        _ => OutputFormat::Chart,
    })
}

/// Booleans, `"true"`, and the editor's legacy `"group"` marker.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s == "group" || s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    })
}
