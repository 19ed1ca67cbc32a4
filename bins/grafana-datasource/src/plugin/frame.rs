use chrono::{DateTime, Utc};
use grafana_plugin_sdk::data::Frame;
use grafana_plugin_sdk::prelude::*;
use serde_json::Value;
use solr_query::values::{as_number, display};
use solr_query::{Annotation, ColumnKind, Series, TableSeries, TimeSeries};

static NULL: Value = Value::Null;

// ═══════════════════════════════════════════════════════════════
//  Frame builders
// ═══════════════════════════════════════════════════════════════

/// One frame per series. `table_name` names table frames, which carry
/// no series name of their own.
pub(crate) fn frames_from_series(series: &[Series], table_name: &str) -> Vec<Frame> {
    series
        .iter()
        .map(|s| match s {
            Series::TimeSeries(ts) => time_series_frame(ts),
            Series::Table(table) => table_frame(table_name, table),
        })
        .collect()
}

/// `time` plus one numeric field named after the series. Non-numeric
/// values become NaN; points with an out-of-range timestamp are dropped.
pub(crate) fn time_series_frame(series: &TimeSeries) -> Frame {
    let (timestamps, values) = time_series_columns(series);
    Frame::new(series.target.as_str())
        .with_field(timestamps.into_field("time"))
        .with_field(values.into_field(series.target.as_str()))
}

fn time_series_columns(series: &TimeSeries) -> (Vec<DateTime<Utc>>, Vec<f64>) {
    let len = series.datapoints.len();
    let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(len);
    let mut values: Vec<f64> = Vec::with_capacity(len);

    for point in &series.datapoints {
        let Some(dt) = DateTime::from_timestamp_millis(point.timestamp_ms()) else {
            tracing::debug!(
                series = %series.target,
                timestamp_ms = point.timestamp_ms(),
                "dropping point with out-of-range timestamp"
            );
            continue;
        };
        timestamps.push(dt);
        values.push(point.number().unwrap_or(f64::NAN));
    }

    (timestamps, values)
}

/// One field per column. String columns whose values are all numeric
/// (or null) become numeric fields.
pub(crate) fn table_frame(name: &str, table: &TableSeries) -> Frame {
    let mut frame = Frame::new(name);

    for (idx, column) in table.columns.iter().enumerate() {
        let cells = table.rows.iter().map(|row| row.get(idx).unwrap_or(&NULL));
        match column.kind {
            ColumnKind::Time => {
                let col: Vec<DateTime<Utc>> = cells
                    .map(|v| {
                        v.as_i64()
                            .and_then(DateTime::from_timestamp_millis)
                            .unwrap_or_default()
                    })
                    .collect();
                frame = frame.with_field(col.into_field(column.text.as_str()));
            }
            ColumnKind::String if is_numeric_column(table, idx) => {
                let col: Vec<f64> = cells.map(|v| as_number(v).unwrap_or(f64::NAN)).collect();
                frame = frame.with_field(col.into_field(column.text.as_str()));
            }
            ColumnKind::String => {
                let col: Vec<String> = cells.map(cell_text).collect();
                frame = frame.with_field(col.into_field(column.text.as_str()));
            }
        }
    }

    frame
}

/// Annotation events as `time`, `title`, `tags`, `text` fields.
pub(crate) fn annotations_frame(annotations: &[Annotation]) -> Frame {
    let len = annotations.len();
    let mut times: Vec<DateTime<Utc>> = Vec::with_capacity(len);
    let mut titles: Vec<String> = Vec::with_capacity(len);
    let mut tags: Vec<String> = Vec::with_capacity(len);
    let mut texts: Vec<String> = Vec::with_capacity(len);

    for a in annotations {
        times.push(DateTime::from_timestamp_millis(a.time_ms).unwrap_or_default());
        titles.push(a.title.clone().unwrap_or_default());
        tags.push(a.tags.join(","));
        texts.push(a.text.clone().unwrap_or_default());
    }

    Frame::new("annotations")
        .with_field(times.into_field("time"))
        .with_field(titles.into_field("title"))
        .with_field(tags.into_field("tags"))
        .with_field(texts.into_field("text"))
}

// ═══════════════════════════════════════════════════════════════
//  Cell helpers
// ═══════════════════════════════════════════════════════════════

fn is_numeric_column(table: &TableSeries, idx: usize) -> bool {
    let mut cells = table
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .filter(|v| !v.is_null())
        .peekable();
    cells.peek().is_some() && cells.all(Value::is_number)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => display(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solr_query::{Column, Datapoint};

    #[test]
    fn test_time_series_frame() {
        let series = TimeSeries::new(
            "cpu",
            vec![
                Datapoint(json!(1.5), 1_514_764_801_000),
                Datapoint(json!("n/a"), 1_514_764_802_000),
                Datapoint(json!(0), 1_514_764_803_000),
            ],
        );
        let frame = time_series_frame(&series);
        let names: Vec<&str> = frame.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["time", "cpu"]);
        assert!(frame.check().is_ok());
    }

    #[test]
    fn test_out_of_range_timestamps_are_dropped() {
        let series = TimeSeries::new(
            "cpu",
            vec![
                Datapoint(json!(1), i64::MAX),
                Datapoint(json!(2), 1_514_764_801_000),
            ],
        );
        let (timestamps, values) = time_series_columns(&series);
        assert_eq!(timestamps.len(), 1);
        assert_eq!(timestamps[0].timestamp_millis(), 1_514_764_801_000);
        assert_eq!(values, vec![2.0]);
    }

    #[test]
    fn test_table_frame_column_types() {
        let table = TableSeries {
            columns: vec![Column::time(), Column::string("host"), Column::string("load")],
            rows: vec![
                vec![json!(1_514_764_801_000_i64), json!("web-1"), json!(0.5)],
                vec![json!(1_514_764_802_000_i64), json!(["a", "b"]), json!(null)],
            ],
        };
        assert!(!is_numeric_column(&table, 1));
        assert!(is_numeric_column(&table, 2));

        let frame = table_frame("metrics", &table);
        let names: Vec<&str> = frame.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Time", "host", "load"]);
        assert!(frame.check().is_ok());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!(["a", 1])), "a,1");
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&json!(true)), "true");
    }

    #[test]
    fn test_annotations_frame() {
        let frame = annotations_frame(&[Annotation {
            time_ms: 1_514_764_801_000,
            title: Some("deploy".into()),
            tags: vec!["a".into(), "b".into()],
            text: None,
        }]);
        let names: Vec<&str> = frame.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["time", "title", "tags", "text"]);
        assert!(frame.check().is_ok());
    }

    #[test]
    fn test_frames_from_series_keeps_order() {
        let series = vec![
            Series::from(TimeSeries::new("a", vec![])),
            Series::from(TableSeries { columns: vec![], rows: vec![] }),
            Series::from(TimeSeries::new("b", vec![])),
        ];
        let frames = frames_from_series(&series, "metrics");
        let names: Vec<&str> = frames.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "metrics", "b"]);
    }
}
