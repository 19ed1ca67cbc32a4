//! Canned editor choices.

use crate::values::TextValue;

/// Hourly max anomaly score per job over the query window.
pub const HEATMAP_FACET: &str = r#"facet=true&json.facet={"heatMapFacet":{"numBuckets":true,"offset":0,"limit":10000,"type":"terms","field":"jobId","facet":{"Day0":{"type":"range","field":"timestamp","start":"__START_TIME__","end":"__END_TIME__","gap":"+1HOUR","facet":{"score":{"type":"query","q":"*:*","facet":{"score":"max(score_value)"}}}}}}}"#;

/// Actual / score / anomaly terms per job, partition and timestamp.
pub const LINE_CHART_FACET: &str = r#"facet=true&json.facet={"lineChartFacet":{"numBuckets":true,"offset":0,"limit":10,"type":"terms","field":"jobId","facet":{"group":{"numBuckets":true,"offset":0,"limit":10,"type":"terms","field":"partition_fields","sort":"s desc","ss":"sum(s)","facet":{"s":"sum(score_value)","timestamp":{"type":"terms","limit":-1,"field":"timestamp","sort":"index","facet":{"actual":{"type":"terms","field":"actual_value"},"score":{"type":"terms","field":"score_value"},"anomaly":{"type":"terms","field":"is_anomaly"}}}}}}}}"#;

pub const RAW_MESSAGES: &str = "getRawMessages=true";

pub fn raw_param_presets() -> Vec<TextValue> {
    vec![
        TextValue::new("HeatMap Facet Query", HEATMAP_FACET),
        TextValue::new("LineChart FacetQuery", LINE_CHART_FACET),
        TextValue::new("Get Raw Messages", RAW_MESSAGES),
    ]
}

pub fn output_formats() -> Vec<TextValue> {
    vec![
        TextValue::new("Table", "table"),
        TextValue::new("Chart", "chart"),
        TextValue::new("Single", "single"),
    ]
}
