use async_trait::async_trait;
use serde_json::Value;

use crate::compiler::CompiledRequest;
use crate::error::TransportError;

// ═══════════════════════════════════════════════════════════════
//  Transport capability
// ═══════════════════════════════════════════════════════════════

/// A successful backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct SolrResponse {
    pub status: u16,
    /// Parsed JSON body; non-JSON bodies (CSV) arrive as a JSON string.
    pub data: Value,
}

/// Executes compiled requests against the backend. Timeouts, retries and
/// cancellation belong to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &CompiledRequest) -> Result<SolrResponse, TransportError>;
}

// ═══════════════════════════════════════════════════════════════
//  HttpTransport — reqwest
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Basic {
        user: String,
        password: Option<String>,
    },
    Bearer(String),
}

/// HTTP transport rooted at a Solr base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth: Option<Auth>,
}

impl HttpTransport {
    /// `with_credentials` keeps a cookie store so session cookies set by
    /// the backend are sent back on later requests of this transport.
    pub fn new(
        base_url: &str,
        auth: Option<Auth>,
        with_credentials: bool,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(with_credentials)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, request: &CompiledRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &CompiledRequest) -> Result<SolrResponse, TransportError> {
        let url = self.url_for(request);
        tracing::debug!(%url, params = request.params().len(), "solr request");

        let mut builder = self.client.get(&url).query(request.params().as_pairs());
        builder = match &self.auth {
            Some(Auth::Basic { user, password }) => builder.basic_auth(user, password.as_ref()),
            Some(Auth::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Ok(SolrResponse {
            status: status.as_u16(),
            data,
        })
    }
}
