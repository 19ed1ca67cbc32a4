use bytes::Bytes;
use grafana_plugin_sdk::backend;
use http::Response;

// ═══════════════════════════════════════════════════════════════
//  Error types
// ═══════════════════════════════════════════════════════════════

/// Grafana plugin error for individual queries.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub ref_id: String,
    pub message: String,
}

impl QueryError {
    pub fn new(ref_id: impl Into<String>, message: impl ToString) -> Self {
        Self {
            ref_id: ref_id.into(),
            message: message.to_string(),
        }
    }
}

impl backend::DataQueryError for QueryError {
    fn ref_id(self) -> String {
        self.ref_id
    }
}

/// Error type for resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<solr_query::QueryError> for ResourceError {
    fn from(e: solr_query::QueryError) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<solr_query::TransportError> for ResourceError {
    fn from(e: solr_query::TransportError) -> Self {
        Self::Http(e.to_string())
    }
}

impl backend::ErrIntoHttpResponse for ResourceError {
    fn into_http_response(self) -> Result<http::Response<Bytes>, Box<dyn std::error::Error>> {
        let status = match &self {
            Self::Http(_) => http::StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            Self::NotFound(_) => http::StatusCode::NOT_FOUND,
        };
        Ok(Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(serde_json::to_vec(
                &serde_json::json!({"error": self.to_string()}),
            ).unwrap_or_default()))?)
    }
}
