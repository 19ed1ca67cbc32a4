use std::sync::Arc;

use futures::stream::FuturesOrdered;
use grafana_plugin_sdk::backend::{self, async_trait, BoxDataResponseStream, DataResponse};
use grafana_plugin_sdk::data::Frame;
use solr_query::TimeRange;

use super::error::QueryError;
use super::frame::{annotations_frame, frames_from_series};
use super::query::{QueryType, SolrQuery};
use super::settings::{DatasourceConfig, SolrOrchestrator};
use super::SolrPlugin;

// ═══════════════════════════════════════════════════════════════
//  DataService
// ═══════════════════════════════════════════════════════════════

#[async_trait]
impl backend::DataService for SolrPlugin {
    type Query = SolrQuery;
    type QueryError = QueryError;
    type Stream = BoxDataResponseStream<Self::QueryError>;

    /// Each query runs its own pipeline; one failing query does not
    /// affect the responses of the others.
    async fn query_data(
        &self,
        request: backend::QueryDataRequest<Self::Query, Self>,
    ) -> Self::Stream {
        let config = DatasourceConfig::from_instance(request.plugin_context.instance_settings.as_ref());
        let orchestrator = config.orchestrator().map(Arc::new);
        if let Err(e) = &orchestrator {
            tracing::error!(error = %e, base_url = %config.base_url, "failed to build solr client");
        }

        Box::pin(
            request
                .queries
                .into_iter()
                .map(|q| {
                    let orchestrator = orchestrator.clone();
                    async move {
                        let orchestrator = orchestrator
                            .map_err(|e| QueryError::new(q.ref_id.clone(), format!("solr client: {e}")))?;
                        handle_query(&orchestrator, &q).await
                    }
                })
                .collect::<FuturesOrdered<_>>(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════
//  Query handler
// ═══════════════════════════════════════════════════════════════

async fn handle_query(
    orchestrator: &SolrOrchestrator,
    query: &backend::DataQuery<SolrQuery>,
) -> Result<DataResponse, QueryError> {
    let ref_id = query.ref_id.clone();
    let range = TimeRange::new(query.time_range.from, query.time_range.to);
    let model = &query.query;

    let frames = match model.query_type {
        QueryType::Annotations => {
            let annotations = orchestrator
                .run_annotations(&model.annotation, &range, &model.scoped_vars)
                .await
                .map_err(|e| QueryError::new(ref_id.clone(), e))?;
            tracing::debug!(%ref_id, annotations = annotations.len(), "annotation query done");
            vec![annotations_frame(&annotations)]
        }
        QueryType::Series => {
            let target = &model.target;
            let series = orchestrator
                .run_target(target, &range, &model.scoped_vars)
                .await
                .map_err(|e| QueryError::new(ref_id.clone(), e))?;
            frames_from_series(&series, &target.collection)
        }
    };

    let checked = frames
        .iter()
        .map(|frame: &Frame| {
            frame
                .check()
                .map_err(|e| QueryError::new(ref_id.clone(), format!("frame error: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DataResponse::new(ref_id, checked))
}
