/// Failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP client: {0}")]
    Client(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("solr HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("read response body: {0}")]
    Body(String),
}

/// Failure of one target pipeline.
///
/// Invalid targets never produce an error (they are skipped) and
/// malformed bodies normalize to an empty result, so the only failure
/// left is the transport's.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("{target}: {source}")]
    Transport {
        target: String,
        source: TransportError,
    },
}

impl QueryError {
    pub(crate) fn transport(target: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            target: target.into(),
            source,
        }
    }
}
