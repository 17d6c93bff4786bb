//! Public entry point: wires together every pass in order (spec §4, §7),
//! grounded in `examples/original_source/quarry/engine.py`'s `execute_query`.

use crate::error::{QueryError, QueryResult};
use crate::result_builder::{build_select_result, PendingTs};
use crate::static_executor::StaticStore;
use crate::ts_executor::{self, TimeSeriesStore};
use hybridquery_frame::Frame;
use hybridquery_inference::infer_to_fixpoint;
use hybridquery_model::build_from_sparql;
use hybridquery_planner::{back_propagate, plan};
use hybridquery_rewrite::{emit_query, rewrite};

/// Ties a static RDF endpoint and a time-series store into one splitter.
///
/// Both collaborators are trait objects (spec §5: "the RDF endpoint client
/// and the time-series-store client are shared across queries... MUST be
/// safe for concurrent use"); a `HybridQueryEngine` is cheaply cloned/shared
/// behind an `Arc` by callers that run concurrent queries.
pub struct HybridQueryEngine {
    static_store: Box<dyn StaticStore>,
    time_series_store: Box<dyn TimeSeriesStore>,
}

impl HybridQueryEngine {
    #[must_use]
    pub fn new(
        static_store: Box<dyn StaticStore>,
        time_series_store: Box<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            static_store,
            time_series_store,
        }
    }

    #[must_use]
    pub fn builder() -> HybridQueryEngineBuilder {
        HybridQueryEngineBuilder::default()
    }

    /// Runs the full split-query pipeline for `sparql_text` and returns the
    /// integrated result frame, projected to the query's original SELECT list.
    pub async fn execute_query(&self, sparql_text: &str) -> QueryResult<Frame> {
        let (op, mut arena) = build_from_sparql(sparql_text)?;
        infer_to_fixpoint(&op, &mut arena);

        let rewritten = rewrite(&op, &mut arena);
        let static_query = emit_query(&rewritten, &arena)?;

        let static_frame = self
            .static_store
            .execute(&static_query)
            .await
            .map_err(QueryError::Endpoint)?;

        back_propagate(&op, &mut arena, &static_frame);
        let requests = plan(&op, &arena, &static_frame)?;
        let ts_frames =
            ts_executor::execute_all(&requests, self.time_series_store.as_ref(), &arena).await?;

        let dropped = columns_to_drop(&static_frame, &requests, &arena);
        let static_frame = static_frame.drop_columns(
            &dropped.iter().map(String::as_str).collect::<Vec<_>>(),
        );

        let pending: Vec<PendingTs> = requests
            .into_iter()
            .zip(ts_frames)
            .map(|(request, frame)| PendingTs { request, frame })
            .collect();

        build_select_result(&op, &arena, static_frame, pending)
    }
}

/// Builder for [`HybridQueryEngine`] (spec §9: re-architect the source's
/// module-level singletons as an owned, re-entrant context), grounded in the
/// teacher's `QueryOptions`/`GraphFusionInstance::new_with_storage` builder
/// conventions: collaborators are supplied incrementally and validated only
/// at `build()`.
#[derive(Default)]
pub struct HybridQueryEngineBuilder {
    static_store: Option<Box<dyn StaticStore>>,
    time_series_store: Option<Box<dyn TimeSeriesStore>>,
}

impl HybridQueryEngineBuilder {
    #[must_use]
    pub fn with_static_store(mut self, store: Box<dyn StaticStore>) -> Self {
        self.static_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_time_series_store(mut self, store: Box<dyn TimeSeriesStore>) -> Self {
        self.time_series_store = Some(store);
        self
    }

    /// # Panics
    ///
    /// Panics if either collaborator was never supplied: a caller wiring up
    /// a `HybridQueryEngine` without both stores is a programming error, not
    /// a runtime condition the query-splitter's own `QueryError` surface
    /// (spec §4.8) is meant to describe.
    #[must_use]
    pub fn build(self) -> HybridQueryEngine {
        HybridQueryEngine::new(
            self.static_store
                .expect("HybridQueryEngineBuilder::build called without a static store"),
            self.time_series_store
                .expect("HybridQueryEngineBuilder::build called without a time-series store"),
        )
    }
}

/// Columns the static frame carries only to drive back-propagation/planning
/// and that must not leak into the integrated result: every `*_is_ext_var`
/// helper column, plus any data-variable column a time-series request ended
/// up owning (mirrors `engine.py`'s `dropmore`/`dropvars`).
fn columns_to_drop(
    static_frame: &Frame,
    requests: &[hybridquery_planner::TimeSeriesRequest],
    arena: &hybridquery_model::TermArena,
) -> Vec<String> {
    let mut dropped: Vec<String> = static_frame
        .columns()
        .iter()
        .filter(|name| name.ends_with("_is_ext_var"))
        .cloned()
        .collect();
    for request in requests {
        if let Some(data_var) = request.data_var {
            if let Some(name) = arena.variable_name(data_var) {
                dropped.push(name.to_owned());
            }
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hybridquery_frame::Scalar;
    use hybridquery_inference::{REAL_VALUE_VERB, TIMESTAMP_VERB};
    use hybridquery_planner::TimeSeriesRequest;

    struct FakeTimeSeriesStore;

    #[async_trait]
    impl TimeSeriesStore for FakeTimeSeriesStore {
        async fn execute(&self, request: &TimeSeriesRequest) -> Result<Frame, String> {
            let mut frame = Frame::new(vec!["signal_id".to_owned(), "ts".to_owned(), "real_value".to_owned()]);
            for id in &request.signal_ids {
                frame.push_row(vec![Scalar::Int(*id), Scalar::Str("2024-01-01T00:00:00Z".into()), Scalar::Real(1.5)]);
            }
            Ok(frame)
        }
    }

    #[tokio::test]
    async fn columns_to_drop_collects_consumed_data_variable_names() {
        let (op, mut arena) = build_from_sparql(&format!(
            "SELECT ?v ?ts WHERE {{ ?val <{REAL_VALUE_VERB}> ?v . ?val <{TIMESTAMP_VERB}> ?ts . }}"
        ))
        .unwrap();
        infer_to_fixpoint(&op, &mut arena);

        let mut static_frame = Frame::new(vec!["val_signal_id".to_owned()]);
        static_frame.push_row(vec![Scalar::Int(1)]);
        back_propagate(&op, &mut arena, &static_frame);
        let requests = plan(&op, &arena, &static_frame).unwrap();

        let dropped = columns_to_drop(&static_frame, &requests, &arena);
        assert_eq!(dropped, vec!["v".to_owned()]);

        let _ = FakeTimeSeriesStore;
    }
}
