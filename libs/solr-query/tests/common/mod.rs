//! Shared fixtures for pipeline tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use solr_query::{CompiledRequest, SolrResponse, TimeRange, Transport, TransportError};

/// Fake Solr that answers in the shape the request asks for: grouped
/// documents for `group=true`, facet trees for `json.facet`, plain
/// documents otherwise. Documents come back newest first.
pub struct FakeSolr;

#[async_trait]
impl Transport for FakeSolr {
    async fn execute(&self, request: &CompiledRequest) -> Result<SolrResponse, TransportError> {
        let params = request.params();
        let time = params
            .get("fl")
            .and_then(|fl| fl.split(',').next())
            .unwrap_or("timestamp")
            .to_string();

        let data = if params.get("group") == Some("true") {
            let field = params.get("group.field").unwrap_or_default();
            json!({
                "responseHeader": {"params": {"group.field": field, "fl": params.get("fl")}},
                "grouped": {field: {"matches": 2, "groups": [
                    {"groupValue": "web-1", "doclist": {"numFound": 2, "docs": [
                        {time.as_str(): "2018-01-01T00:00:02Z", "cpu": 20},
                        {time.as_str(): "2018-01-01T00:00:01Z", "cpu": 10}
                    ]}}
                ]}}
            })
        } else if params.get("json.facet").is_some_and(|f| f.contains("heatMapFacet")) {
            json!({
                "response": {"numFound": 0, "docs": []},
                "facets": {"count": 2, "heatMapFacet": {"buckets": [
                    {"val": "job-b", "Day0": {"buckets": [
                        {"val": "2018-01-01T00:00:00Z", "score": {"score": 4.0}}
                    ]}},
                    {"val": "job-a", "Day0": {"buckets": [
                        {"val": "2018-01-01T00:00:00Z", "score": {"score": 1.0}}
                    ]}}
                ]}}
            })
        } else {
            json!({
                "responseHeader": {"status": 0},
                "response": {"numFound": 2, "docs": [
                    {time.as_str(): "2018-01-01T00:00:02Z", "cpu": 20, "host": "web-1"},
                    {time.as_str(): "2018-01-01T00:00:01Z", "cpu": 10, "host": "web-1"}
                ]}
            })
        };

        Ok(SolrResponse { status: 200, data })
    }
}

pub fn day() -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 1, 2, 0, 0, 0).unwrap(),
    )
}

pub fn body_of(value: &Value) -> String {
    serde_json::to_string(value).unwrap()
}
