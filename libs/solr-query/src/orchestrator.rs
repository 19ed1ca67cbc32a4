use futures::future::{join_all, try_join_all};

use crate::annotation::{Annotation, AnnotationSpec};
use crate::compiler::{Compiled, CompiledRequest, compile};
use crate::error::QueryError;
use crate::normalize::normalize;
use crate::series::Series;
use crate::target::{TargetSpec, TimeRange};
use crate::template::{VariableBindings, VariableResolver};
use crate::transport::Transport;
use crate::values::{TextValue, map_to_text_value};

// ═══════════════════════════════════════════════════════════════
//  Orchestrator — compile → transport → normalize, per target
// ═══════════════════════════════════════════════════════════════

/// Runs target pipelines against one backend.
///
/// Pipelines share no mutable state: the time field used to normalize a
/// response is always the one of the target that produced it.
#[derive(Debug, Clone)]
pub struct Orchestrator<T, R> {
    transport: T,
    resolver: R,
}

impl<T, R> Orchestrator<T, R>
where
    T: Transport,
    R: VariableResolver,
{
    pub fn new(transport: T, resolver: R) -> Self {
        Self {
            transport,
            resolver,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run every target concurrently and concatenate their series in target
    /// order. The first transport failure fails the whole result.
    pub async fn run_query(
        &self,
        targets: &[TargetSpec],
        range: &TimeRange,
        vars: &VariableBindings,
    ) -> Result<Vec<Series>, QueryError> {
        let pipelines = targets.iter().map(|t| self.run_target(t, range, vars));
        let per_target = try_join_all(pipelines).await?;
        Ok(per_target.into_iter().flatten().collect())
    }

    /// Run every target concurrently, keeping each target's outcome apart.
    pub async fn run_each(
        &self,
        targets: &[TargetSpec],
        range: &TimeRange,
        vars: &VariableBindings,
    ) -> Vec<Result<Vec<Series>, QueryError>> {
        join_all(targets.iter().map(|t| self.run_target(t, range, vars))).await
    }

    /// One pipeline. Excluded targets yield no series.
    pub async fn run_target(
        &self,
        target: &TargetSpec,
        range: &TimeRange,
        vars: &VariableBindings,
    ) -> Result<Vec<Series>, QueryError> {
        let request = match compile(target, range, vars, &self.resolver) {
            Compiled::Request(request) => request,
            Compiled::Skip(_) => return Ok(Vec::new()),
        };

        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|e| QueryError::transport(target.collection.as_str(), e))?;

        let series = normalize(&response.data, target.output_format, &target.time_field);
        tracing::debug!(
            collection = %target.collection,
            series = series.len(),
            "target normalized"
        );
        Ok(series)
    }

    pub async fn run_annotations(
        &self,
        spec: &AnnotationSpec,
        range: &TimeRange,
        vars: &VariableBindings,
    ) -> Result<Vec<Annotation>, QueryError> {
        let request = spec.compile(range, vars, &self.resolver);
        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|e| QueryError::transport(spec.collection.as_str(), e))?;
        Ok(spec.annotations_from(&response.data))
    }

    /// Execute a helper request and map its body to autocomplete entries.
    pub async fn lookup(&self, request: &CompiledRequest) -> Result<Vec<TextValue>, QueryError> {
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| QueryError::transport(request.path(), e))?;
        Ok(map_to_text_value(&response.data))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use super::*;
    use crate::error::TransportError;
    use crate::target::OutputFormat;
    use crate::template::ScopedVarResolver;
    use crate::transport::SolrResponse;

    /// Answers by collection; collections listed in `delays` answer late.
    #[derive(Default)]
    struct MockTransport {
        bodies: Vec<(String, Value)>,
        delays: Vec<(String, u64)>,
        seen: Mutex<Vec<CompiledRequest>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockTransport {
        fn with(mut self, collection: &str, body: Value) -> Self {
            self.bodies.push((format!("/solr/{collection}/select"), body));
            self
        }

        fn delayed(mut self, collection: &str, millis: u64) -> Self {
            self.delays.push((format!("/solr/{collection}/select"), millis));
            self
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: &CompiledRequest) -> Result<SolrResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            if let Some((_, millis)) = self.delays.iter().find(|(p, _)| p == request.path()) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.bodies.iter().find(|(p, _)| p == request.path()) {
                Some((_, body)) => Ok(SolrResponse { status: 200, data: body.clone() }),
                None => Err(TransportError::Status { status: 404, body: "no such collection".into() }),
            }
        }
    }

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 1, 2, 0, 0, 0).unwrap(),
        )
    }

    fn docs(time_field: &str, field: &str) -> Value {
        json!({"response": {"numFound": 1, "docs": [
            {time_field: "2018-01-01T00:00:01Z", field: 1}
        ]}})
    }

    fn targets(out: &[Series]) -> Vec<String> {
        out.iter()
            .filter_map(Series::as_time_series)
            .map(|ts| ts.target.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_run_query_preserves_target_order() {
        let transport = MockTransport::default()
            .with("slow", docs("ts", "first"))
            .with("fast", docs("time", "second"))
            .delayed("slow", 30);
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let out = orchestrator
            .run_query(
                &[
                    TargetSpec::new("slow", "ts", "*:*"),
                    TargetSpec::new("fast", "time", "*:*"),
                ],
                &range(),
                &VariableBindings::new(),
            )
            .await
            .unwrap();

        assert_eq!(targets(&out), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_run_query_overlaps_target_requests() {
        let transport = MockTransport::default()
            .with("a", docs("ts", "cpu"))
            .with("b", docs("ts", "mem"))
            .delayed("a", 20)
            .delayed("b", 20);
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        orchestrator
            .run_query(
                &[TargetSpec::new("a", "ts", "*:*"), TargetSpec::new("b", "ts", "*:*")],
                &range(),
                &VariableBindings::new(),
            )
            .await
            .unwrap();

        // Both requests were in flight before either finished.
        assert_eq!(orchestrator.transport().max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.transport().in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_target_uses_its_own_time_field() {
        let transport = MockTransport::default()
            .with("a", docs("ts", "cpu"))
            .with("b", docs("time", "mem"));
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let out = orchestrator
            .run_query(
                &[TargetSpec::new("a", "ts", "*:*"), TargetSpec::new("b", "time", "*:*")],
                &range(),
                &VariableBindings::new(),
            )
            .await
            .unwrap();

        // A shared time field would leak `ts`/`time` in as extra series.
        assert_eq!(targets(&out), vec!["cpu", "mem"]);
    }

    #[tokio::test]
    async fn test_skipped_targets_are_not_requested() {
        let transport = MockTransport::default().with("a", docs("ts", "cpu"));
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let out = orchestrator
            .run_query(
                &[
                    TargetSpec { hidden: true, ..TargetSpec::new("a", "ts", "*:*") },
                    TargetSpec::new("", "ts", "*:*"),
                    TargetSpec { grouping_enabled: true, ..TargetSpec::new("a", "ts", "*:*") },
                    TargetSpec::new("a", "ts", "*:*"),
                ],
                &range(),
                &VariableBindings::new(),
            )
            .await
            .unwrap();

        assert_eq!(targets(&out), vec!["cpu"]);
        assert_eq!(orchestrator.transport().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_fails_run_query() {
        let transport = MockTransport::default().with("a", docs("ts", "cpu"));
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let err = orchestrator
            .run_query(
                &[TargetSpec::new("a", "ts", "*:*"), TargetSpec::new("missing", "ts", "*:*")],
                &range(),
                &VariableBindings::new(),
            )
            .await
            .unwrap_err();

        let QueryError::Transport { target, source } = err;
        assert_eq!(target, "missing");
        assert!(matches!(source, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_run_each_isolates_failures() {
        let transport = MockTransport::default().with("a", docs("ts", "cpu"));
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let results = orchestrator
            .run_each(
                &[TargetSpec::new("missing", "ts", "*:*"), TargetSpec::new("a", "ts", "*:*")],
                &range(),
                &VariableBindings::new(),
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(targets(results[1].as_ref().unwrap()), vec!["cpu"]);
    }

    #[tokio::test]
    async fn test_single_format_through_pipeline() {
        let transport = MockTransport::default().with("a", docs("ts", "cpu"));
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);
        let target = TargetSpec {
            output_format: OutputFormat::Single,
            ..TargetSpec::new("a", "ts", "*:*")
        };

        let out = orchestrator
            .run_target(&target, &range(), &VariableBindings::new())
            .await
            .unwrap();
        assert_eq!(targets(&out), vec!["Number of docs"]);
    }

    #[tokio::test]
    async fn test_annotations_and_lookup() {
        let transport = MockTransport::default().with(
            "annotations",
            json!({"response": {"docs": [{"timestamp_dt": "2018-01-01T00:00:01Z", "desc": "deploy"}]}}),
        );
        let orchestrator = Orchestrator::new(transport, ScopedVarResolver);

        let annotations = orchestrator
            .run_annotations(&AnnotationSpec::default(), &range(), &VariableBindings::new())
            .await
            .unwrap();
        assert_eq!(annotations[0].title.as_deref(), Some("deploy"));

        let err = orchestrator
            .lookup(&crate::compiler::list_collections())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("/solr/admin/collections"));
    }
}
