//! Time-series store interface and executor glue (spec §4.6).
//!
//! `TimeSeriesStore` is the one abstract collaborator operation the spec
//! leaves out of scope (§1); `HttpTimeSeriesStore` is a reference adapter
//! for it, grounded in `examples/original_source/quarry/time_series_database.py`'s
//! `TimeSeriesDatabase.execute_query` shape, reimagined as a JSON-over-HTTP
//! client the way `StaticStore` talks to the RDF endpoint.

use crate::error::{QueryError, QueryResult};
use async_trait::async_trait;
use futures::future::try_join_all;
use hybridquery_frame::{Frame, Scalar};
use hybridquery_model::TermArena;
use hybridquery_planner::{Datatype, TimeSeriesRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// The one operation the time-series store must support (spec §6: "one
/// operation, `execute(request) -> frame`... any wire format is acceptable").
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    async fn execute(&self, request: &TimeSeriesRequest) -> Result<Frame, String>;
}

/// A reference `TimeSeriesStore` that POSTs each request as JSON and expects
/// a JSON array of rows back.
pub struct HttpTimeSeriesStore {
    client: Client,
    endpoint: String,
}

impl HttpTimeSeriesStore {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    signal_ids: &'a [i64],
    datatype: Option<&'static str>,
    with_timestamp: bool,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    signal_id: i64,
    ts: Option<String>,
    str_value: Option<String>,
    real_value: Option<f64>,
    int_value: Option<i64>,
    bool_value: Option<bool>,
}

#[async_trait]
impl TimeSeriesStore for HttpTimeSeriesStore {
    async fn execute(&self, request: &TimeSeriesRequest) -> Result<Frame, String> {
        let wire = WireRequest {
            signal_ids: &request.signal_ids,
            datatype: request.datatype.map(datatype_wire_name),
            with_timestamp: request.timestamp_var.is_some(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&wire)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let response = response.error_for_status().map_err(|err| err.to_string())?;
        let rows: Vec<WireRow> = response.json().await.map_err(|err| err.to_string())?;
        Ok(wire_rows_to_frame(request.datatype, request.timestamp_var.is_some(), rows))
    }
}

fn datatype_wire_name(datatype: Datatype) -> &'static str {
    match datatype {
        Datatype::Str => "str",
        Datatype::Real => "real",
        Datatype::Int => "int",
        Datatype::Bool => "bool",
    }
}

fn wire_rows_to_frame(datatype: Option<Datatype>, with_timestamp: bool, rows: Vec<WireRow>) -> Frame {
    let mut columns = vec!["signal_id".to_owned()];
    if with_timestamp {
        columns.push("ts".to_owned());
    }
    if let Some(datatype) = datatype {
        columns.push(value_column_name(datatype).to_owned());
    }
    let mut frame = Frame::new(columns);
    for row in rows {
        let mut cells = vec![Scalar::Int(row.signal_id)];
        if with_timestamp {
            cells.push(row.ts.map_or(Scalar::Null, Scalar::Str));
        }
        if let Some(datatype) = datatype {
            cells.push(match datatype {
                Datatype::Str => row.str_value.map_or(Scalar::Null, Scalar::Str),
                Datatype::Real => row.real_value.map_or(Scalar::Null, Scalar::Real),
                Datatype::Int => row.int_value.map_or(Scalar::Null, Scalar::Int),
                Datatype::Bool => row.bool_value.map_or(Scalar::Null, Scalar::Bool),
            });
        }
        frame.push_row(cells);
    }
    frame
}

fn value_column_name(datatype: Datatype) -> &'static str {
    match datatype {
        Datatype::Str => "str_value",
        Datatype::Real => "real_value",
        Datatype::Int => "int_value",
        Datatype::Bool => "bool_value",
    }
}

/// Dispatches every planned request (spec §5: independent, MAY run in
/// parallel) and renames each result frame's columns to the variable names
/// the integrated result builder expects: `signal_id` -> `<subject>_signal_id`,
/// `<dt>_value` -> `<data_var>`, `ts` -> `<timestamp_var>`.
pub async fn execute_all(
    requests: &[TimeSeriesRequest],
    store: &dyn TimeSeriesStore,
    arena: &TermArena,
) -> QueryResult<Vec<Frame>> {
    let futures = requests.iter().map(|request| async move {
        let span = tracing::info_span!("ts_request", request_id = %uuid::Uuid::new_v4());
        let _enter = span.enter();
        let raw = store
            .execute(request)
            .await
            .map_err(QueryError::TimeSeries)?;
        Ok::<Frame, QueryError>(rename_result(request, &raw, arena))
    });
    try_join_all(futures).await
}

fn rename_result(request: &TimeSeriesRequest, frame: &Frame, arena: &TermArena) -> Frame {
    let subject_name = arena
        .variable_name(request.variable_term)
        .expect("TimeSeriesRequest::variable_term is always a Variable");
    let mut columns = Vec::with_capacity(frame.ncols());
    for column in frame.columns() {
        let renamed = if column == "signal_id" {
            format!("{subject_name}_signal_id")
        } else if column == "ts" && request.timestamp_var.is_some() {
            arena
                .variable_name(request.timestamp_var.expect("checked by the guard above"))
                .expect("timestamp_var is always a Variable")
                .to_owned()
        } else if let (Some(datatype), Some(data_var)) = (request.datatype, request.data_var) {
            if column == value_column_name(datatype) {
                arena
                    .variable_name(data_var)
                    .expect("data_var is always a Variable")
                    .to_owned()
            } else {
                column.clone()
            }
        } else {
            column.clone()
        };
        columns.push(renamed);
    }
    Frame::from_rows(columns, frame.rows().to_vec())
}
