use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::values::as_number;

// ═══════════════════════════════════════════════════════════════
//  Time series
// ═══════════════════════════════════════════════════════════════

/// `[value, timestampMillis]`, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint(pub Value, pub i64);

impl Datapoint {
    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.1
    }

    pub fn number(&self) -> Option<f64> {
        as_number(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub target: String,
    pub datapoints: Vec<Datapoint>,
}

impl TimeSeries {
    pub fn new(target: impl Into<String>, datapoints: Vec<Datapoint>) -> Self {
        Self {
            target: target.into(),
            datapoints,
        }
    }

    /// Sum of the numeric datapoint values; non-numeric values count as zero.
    pub fn value_sum(&self) -> f64 {
        self.datapoints.iter().filter_map(Datapoint::number).sum()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Time,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

impl Column {
    pub fn time() -> Self {
        Self {
            text: "Time".to_string(),
            kind: ColumnKind::Time,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: ColumnKind::String,
        }
    }
}

/// Rows are positional; the columns come from the first document only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSeries {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

// ═══════════════════════════════════════════════════════════════
//  Series — one unit of normalized output
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    TimeSeries(TimeSeries),
    Table(TableSeries),
}

impl Series {
    pub fn as_time_series(&self) -> Option<&TimeSeries> {
        match self {
            Self::TimeSeries(ts) => Some(ts),
            Self::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableSeries> {
        match self {
            Self::Table(table) => Some(table),
            Self::TimeSeries(_) => None,
        }
    }
}

impl From<TimeSeries> for Series {
    fn from(ts: TimeSeries) -> Self {
        Self::TimeSeries(ts)
    }
}

impl From<TableSeries> for Series {
    fn from(table: TableSeries) -> Self {
        Self::Table(table)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Keyed accumulation
// ═══════════════════════════════════════════════════════════════

/// Collects datapoints under string keys, remembering first-seen key order.
#[derive(Debug, Default)]
pub(crate) struct SeriesAccumulator {
    index: HashMap<String, usize>,
    series: Vec<TimeSeries>,
}

impl SeriesAccumulator {
    pub(crate) fn push(&mut self, key: &str, point: Datapoint) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key.to_string(), self.series.len());
                self.series.push(TimeSeries::new(key, Vec::new()));
                self.series.len() - 1
            }
        };
        self.series[slot].datapoints.push(point);
    }

    /// Emit every series once, datapoints reversed. Solr returns documents
    /// newest first by default; reversing restores ascending time.
    pub(crate) fn into_reversed(self) -> Vec<Series> {
        self.series
            .into_iter()
            .map(|mut ts| {
                ts.datapoints.reverse();
                Series::TimeSeries(ts)
            })
            .collect()
    }
}
