//! Reshape Solr bodies into canonical series.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::response::{DocList, Document, Group, HeatJobBucket, LineJobBucket, ResponseShape};
use crate::series::{Column, Datapoint, Series, SeriesAccumulator, TableSeries, TimeSeries};
use crate::target::OutputFormat;
use crate::values::{as_number, display, epoch_millis, is_truthy, parse_timestamp};

pub const SINGLE_SERIES_NAME: &str = "Number of docs";

/// Normalize a Solr body using the current wall-clock time for
/// single-value output.
pub fn normalize(payload: &Value, format: OutputFormat, time_field: &str) -> Vec<Series> {
    normalize_at(payload, format, time_field, Utc::now())
}

/// Normalize a Solr body. `now` stamps the single-value datapoint.
///
/// Never fails: bodies without a recognizable shape produce no series.
pub fn normalize_at(
    payload: &Value,
    format: OutputFormat,
    time_field: &str,
    now: DateTime<Utc>,
) -> Vec<Series> {
    match ResponseShape::parse(payload) {
        ResponseShape::LineChartFacet(jobs) => line_chart_series(&jobs),
        ResponseShape::HeatmapFacet(jobs) => heatmap_series(&jobs),
        ResponseShape::UngroupedFlat(docs) => match format {
            OutputFormat::Table => vec![table_series(&docs.docs, time_field).into()],
            OutputFormat::Single => vec![single_series(&docs, now).into()],
            OutputFormat::Chart => chart_series(&docs.docs, time_field),
        },
        ResponseShape::Grouped {
            groups,
            echoed_time_field,
        } => {
            let time_field = if time_field.is_empty() {
                echoed_time_field.as_deref().unwrap_or_default()
            } else {
                time_field
            };
            grouped_series(&groups, time_field)
        }
        ResponseShape::Empty => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Line chart facet — actual / score / anomaly triples
// ═══════════════════════════════════════════════════════════════

fn line_chart_series(jobs: &[LineJobBucket]) -> Vec<Series> {
    let mut out = Vec::new();
    for job in jobs {
        let job_id = display(&job.val);
        for partition in &job.group.buckets {
            let name = format!("{job_id}_{}", partition_suffix(&partition.val));
            let len = partition.timestamp.buckets.len();
            let mut actual_points = Vec::with_capacity(len);
            let mut score_points = Vec::with_capacity(len);
            let mut anomaly_points = Vec::with_capacity(len);

            for bucket in &partition.timestamp.buckets {
                let ts = epoch_millis(&bucket.val);
                let actual = bucket.actual.first_val();
                let (score, anomaly) =
                    gate_anomaly(&actual, bucket.score.first_val(), bucket.anomaly.first_val());
                actual_points.push(Datapoint(actual, ts));
                score_points.push(Datapoint(score, ts));
                anomaly_points.push(Datapoint(anomaly, ts));
            }

            out.push(TimeSeries::new(format!("{name}_actual"), actual_points).into());
            out.push(TimeSeries::new(format!("{name}_score"), score_points).into());
            out.push(TimeSeries::new(format!("{name}_anomaly"), anomaly_points).into());
        }
    }
    out
}

/// A bucket is an anomaly when `score >= 1` and the anomaly flag is
/// truthy; the anomaly point then carries the actual value. Otherwise both
/// score and anomaly are blanked.
pub(crate) fn gate_anomaly(actual: &Value, score: Value, anomaly: Value) -> (Value, Value) {
    let significant = as_number(&score).is_some_and(|s| s >= 1.0);
    if significant && is_truthy(&anomaly) {
        (score, actual.clone())
    } else {
        (Value::Null, Value::Null)
    }
}

/// `aggr_field` of the partition document; the raw partition value when
/// the bucket value is not such a document.
fn partition_suffix(val: &Value) -> String {
    let doc = match val {
        Value::String(s) => serde_json::from_str::<Value>(s).ok(),
        Value::Object(_) => Some(val.clone()),
        _ => None,
    };
    match doc.as_ref().and_then(|d| d.get("aggr_field")) {
        Some(field) => display(field),
        None => {
            tracing::warn!(partition = %val, "partition bucket without aggr_field");
            display(val)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Heatmap facet — one series per job, ordered by total score
// ═══════════════════════════════════════════════════════════════

fn heatmap_series(jobs: &[HeatJobBucket]) -> Vec<Series> {
    let mut series: Vec<TimeSeries> = jobs
        .iter()
        .map(|job| {
            let datapoints = job
                .day0
                .buckets
                .iter()
                .filter_map(|bucket| {
                    let score = &bucket.score.as_ref()?.score;
                    if score.is_null() {
                        return None;
                    }
                    let ts = parse_timestamp(&bucket.val)?;
                    Some(Datapoint(score.clone(), ts))
                })
                .collect();
            TimeSeries::new(display(&job.val), datapoints)
        })
        .collect();

    // Stable: equal sums keep their bucket order.
    series.sort_by(|a, b| a.value_sum().total_cmp(&b.value_sum()));
    series.into_iter().map(Series::from).collect()
}

// ═══════════════════════════════════════════════════════════════
//  Flat documents — table / single / chart
// ═══════════════════════════════════════════════════════════════

/// The first document fixes the columns. Later rows are taken as they
/// come, in their own key order.
fn table_series(docs: &[Document], time_field: &str) -> TableSeries {
    let columns = docs
        .first()
        .map(|doc| {
            doc.keys()
                .map(|key| {
                    if key == time_field {
                        Column::time()
                    } else {
                        Column::string(key.as_str())
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = docs
        .iter()
        .map(|doc| {
            doc.iter()
                .map(|(key, value)| {
                    if key == time_field {
                        Value::from(epoch_millis(value))
                    } else {
                        value.clone()
                    }
                })
                .collect()
        })
        .collect();

    TableSeries { columns, rows }
}

fn single_series(docs: &DocList, now: DateTime<Utc>) -> TimeSeries {
    TimeSeries::new(
        SINGLE_SERIES_NAME,
        vec![Datapoint(docs.num_found.clone(), now.timestamp_millis())],
    )
}

/// One series per non-time field. Falsy values plot as `0`.
fn chart_series(docs: &[Document], time_field: &str) -> Vec<Series> {
    let mut acc = SeriesAccumulator::default();
    for doc in docs {
        let ts = doc.get(time_field).map(epoch_millis).unwrap_or_default();
        for (field, value) in doc.iter().filter(|(field, _)| *field != time_field) {
            let value = if is_truthy(value) {
                value.clone()
            } else {
                Value::from(0)
            };
            acc.push(field, Datapoint(value, ts));
        }
    }
    acc.into_reversed()
}

// ═══════════════════════════════════════════════════════════════
//  Grouped documents — `<groupValue>:<field>` series
// ═══════════════════════════════════════════════════════════════

/// Timestamps are truncated to whole seconds.
fn grouped_series(groups: &[Group], time_field: &str) -> Vec<Series> {
    let mut acc = SeriesAccumulator::default();
    for group in groups {
        let group_value = display(&group.group_value);
        for doc in &group.doclist.docs {
            let ts = doc
                .get(time_field)
                .map(|t| epoch_millis(t).div_euclid(1000) * 1000)
                .unwrap_or_default();
            for (field, value) in doc.iter().filter(|(field, _)| *field != time_field) {
                acc.push(&format!("{group_value}:{field}"), Datapoint(value.clone(), ts));
            }
        }
    }
    acc.into_reversed()
}
