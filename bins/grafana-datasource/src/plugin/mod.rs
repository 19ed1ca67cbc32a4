mod query;
mod error;
mod frame;
mod settings;
mod data_service;
mod resource_service;

use grafana_plugin_sdk::backend::{self, async_trait};
use grafana_plugin_sdk::prelude::*;
use solr_query::compiler::health_check;
use solr_query::Transport;

use settings::DatasourceConfig;

// ═══════════════════════════════════════════════════════════════
//  Plugin struct
// ═══════════════════════════════════════════════════════════════

/// Stateless: every request builds its client from the instance settings
/// it carries.
#[derive(Clone, Debug, Default, GrafanaPlugin)]
#[grafana_plugin(plugin_type = "datasource")]
pub struct SolrPlugin;

impl SolrPlugin {
    pub fn new() -> Self {
        Self
    }
}

// ═══════════════════════════════════════════════════════════════
//  DiagnosticsService
// ═══════════════════════════════════════════════════════════════

#[async_trait]
impl backend::DiagnosticsService for SolrPlugin {
    type CheckHealthError = std::convert::Infallible;
    type CollectMetricsError = std::convert::Infallible;

    async fn check_health(
        &self,
        request: backend::CheckHealthRequest<Self>,
    ) -> Result<backend::CheckHealthResponse, Self::CheckHealthError> {
        let config = DatasourceConfig::from_instance(request.plugin_context.instance_settings.as_ref());
        let base_url = &config.base_url;

        let transport = match config.transport() {
            Ok(transport) => transport,
            Err(e) => {
                return Ok(backend::CheckHealthResponse::error(format!(
                    "Failed to create Solr client for {base_url}: {e}",
                )))
            }
        };

        match transport.execute(&health_check()).await {
            Ok(_) => Ok(backend::CheckHealthResponse::ok(format!(
                "Connected to Solr at {base_url}",
            ))),
            Err(e) => {
                tracing::warn!(%base_url, error = %e, "health check failed");
                Ok(backend::CheckHealthResponse::error(format!(
                    "Failed to connect to Solr at {base_url}: {e}",
                )))
            }
        }
    }

    async fn collect_metrics(
        &self,
        _request: backend::CollectMetricsRequest<Self>,
    ) -> Result<backend::CollectMetricsResponse, Self::CollectMetricsError> {
        Ok(backend::CollectMetricsResponse::new(None))
    }
}
