use std::collections::HashMap;

use bytes::Bytes;
use grafana_plugin_sdk::backend::{self, async_trait};
use http::Response;
use solr_query::compiler::{facet_values, list_collections, list_fields};
use solr_query::presets::{output_formats, raw_param_presets};
use solr_query::TextValue;

use super::error::ResourceError;
use super::settings::DatasourceConfig;
use super::SolrPlugin;

// ═══════════════════════════════════════════════════════════════
//  ResourceService — query editor autocomplete
// ═══════════════════════════════════════════════════════════════

#[async_trait]
impl backend::ResourceService for SolrPlugin {
    type Error = ResourceError;
    type InitialResponse = http::Response<Bytes>;
    type Stream = backend::BoxResourceStream<Self::Error>;

    async fn call_resource(
        &self,
        request: backend::CallResourceRequest<Self>,
    ) -> Result<(Self::InitialResponse, Self::Stream), Self::Error> {
        let config = DatasourceConfig::from_instance(request.plugin_context.instance_settings.as_ref());
        let params = parse_query_string(request.request.uri().query().unwrap_or(""));
        let path = request.request.uri().path();

        let entries = match path {
            "/raw-params" => raw_param_presets(),
            "/output-formats" => output_formats(),
            "/collections" => {
                if !config.settings.solr_cloud_mode {
                    Vec::new()
                } else {
                    config.orchestrator()?.lookup(&list_collections()).await?
                }
            }
            "/fields" => {
                let collection = required(&params, "collection")?;
                config.orchestrator()?.lookup(&list_fields(collection)).await?
            }
            "/facet-values" => {
                let field = required(&params, "field")?;
                let collection = params
                    .get("collection")
                    .map(String::as_str)
                    .filter(|c| !c.is_empty())
                    .or(config.settings.variable_collection());
                match collection {
                    Some(collection) => {
                        config.orchestrator()?.lookup(&facet_values(collection, field)).await?
                    }
                    None => Vec::new(),
                }
            }
            other => return Err(ResourceError::NotFound(format!("unknown resource: {other}"))),
        };

        tracing::debug!(%path, entries = entries.len(), "resource served");
        let response = json_response(&entries)?;
        Ok((response, Box::pin(futures::stream::empty()) as Self::Stream))
    }
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ResourceError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ResourceError::BadRequest(format!("{name} parameter is required")))
}

fn json_response(entries: &[TextValue]) -> Result<Response<Bytes>, ResourceError> {
    let json = serde_json::to_vec(entries)
        .map_err(|e| ResourceError::Http(format!("serialize: {e}")))?;
    Response::builder()
        .status(200)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(json))
        .map_err(|e| ResourceError::Http(e.to_string()))
}

/// Parse query string into key-value pairs.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((
                urlencoding::decode(key).ok()?.into_owned(),
                urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("collection=logs&field=host%2Cextra&empty=&flag");
        assert_eq!(params.get("collection").map(String::as_str), Some("logs"));
        assert_eq!(params.get("field").map(String::as_str), Some("host,extra"));
        assert_eq!(params.get("empty").map(String::as_str), Some(""));
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_required_param() {
        let params = parse_query_string("collection=logs&field=");
        assert_eq!(required(&params, "collection").unwrap(), "logs");
        assert!(matches!(required(&params, "field"), Err(ResourceError::BadRequest(_))));
        assert!(matches!(required(&params, "missing"), Err(ResourceError::BadRequest(_))));
    }

    #[test]
    fn test_json_response_body() {
        let response = json_response(&output_formats()).unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body[0], serde_json::json!({"text": "Table", "value": "table"}));
    }
}
