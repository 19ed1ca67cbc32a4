use serde::Deserialize;
use solr_query::{AnnotationSpec, TargetSpec, VariableBindings};

// ═══════════════════════════════════════════════════════════════
//  Query model — sent by the query editor
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Annotations,
    #[default]
    #[serde(other)]
    Series,
}

/// One panel query. Target fields sit at the top level of the JSON model.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SolrQuery {
    #[serde(flatten)]
    pub target: TargetSpec,
    pub query_type: QueryType,
    /// Only read when `queryType` is `annotations`.
    pub annotation: AnnotationSpec,
    /// Template variables already expanded by the frontend for this panel.
    pub scoped_vars: VariableBindings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solr_query::OutputFormat;

    #[test]
    fn test_deserialize_panel_query() {
        let query: SolrQuery = serde_json::from_value(json!({
            "refId": "A",
            "datasource": {"type": "solr", "uid": "abc"},
            "collection": "metrics",
            "time": "ts",
            "target": "host:$host",
            "outputFormat": "table",
            "groupEnabled": "group",
            "groupByField": "host",
            "scopedVars": {"host": {"text": "web-1", "value": "web-1"}}
        }))
        .unwrap();

        assert_eq!(query.query_type, QueryType::Series);
        assert_eq!(query.target.collection, "metrics");
        assert_eq!(query.target.time_field, "ts");
        assert_eq!(query.target.filter_expression, "host:$host");
        assert_eq!(query.target.output_format, OutputFormat::Table);
        assert!(query.target.grouping_enabled);
        assert!(query.scoped_vars.get("host").is_some());
    }

    #[test]
    fn test_deserialize_annotation_query() {
        let query: SolrQuery = serde_json::from_value(json!({
            "queryType": "annotations",
            "annotation": {"collection": "events", "query": "type:deploy"}
        }))
        .unwrap();

        assert_eq!(query.query_type, QueryType::Annotations);
        assert_eq!(query.annotation.collection, "events");
        assert_eq!(query.annotation.time_field, "timestamp_dt");
    }

    #[test]
    fn test_unknown_query_type_is_series() {
        let query: SolrQuery = serde_json::from_value(json!({"queryType": "logs"})).unwrap();
        assert_eq!(query.query_type, QueryType::Series);
    }
}
