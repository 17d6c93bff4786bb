//! RDF endpoint client (spec §4.5 "Static Executor", §6 "RDF endpoint
//! contract"): sends the emitted SPARQL text over HTTP and parses the JSON
//! results shape the spec defines directly into a [`Frame`].
//!
//! The endpoint's JSON contract (`{head: {vars: [...]}, results: {bindings:
//! [{var: {value: ...}}, ...]}}`) is a simplification of the full W3C
//! SPARQL-results JSON format, so this is parsed with `serde_json` against
//! the documented shape rather than a general-purpose SPARQL results reader
//! (see DESIGN.md).

use async_trait::async_trait;
use hybridquery_frame::{Frame, Scalar};
use reqwest::Client;
use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SparqlJsonResponse {
    head: Head,
    results: Results,
}

#[derive(Debug, Deserialize)]
struct Head {
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Results {
    bindings: Vec<FxHashMap<String, Binding>>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    value: String,
}

/// The one operation the static RDF store must support (spec §6: "accepts
/// SPARQL SELECT text; returns JSON with `{head: ..., results: ...}`").
///
/// Abstracted behind a trait, mirroring `TimeSeriesStore`, so that
/// `hybridquery-engine`'s integration tests can substitute a fixture double
/// for the live HTTP endpoint (see `tests/scenarios.rs`).
#[async_trait]
pub trait StaticStore: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Frame, String>;
}

/// A blocking (async, single round-trip) SPARQL SELECT client over HTTP.
pub struct HttpStaticStore {
    client: Client,
    endpoint: String,
}

impl HttpStaticStore {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl StaticStore for HttpStaticStore {
    /// Sends `query` as the SPARQL SELECT body and parses the response into
    /// a [`Frame`] whose columns are the response's `head.vars`, in order.
    async fn execute(&self, query: &str) -> Result<Frame, String> {
        tracing::debug!(query, "sending static SPARQL query");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .body(query.to_owned())
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let response = response.error_for_status().map_err(|err| err.to_string())?;
        let body: SparqlJsonResponse = response.json().await.map_err(|err| err.to_string())?;
        Ok(parse_response(body))
    }
}

fn parse_response(body: SparqlJsonResponse) -> Frame {
    let columns = body.head.vars;
    let mut frame = Frame::new(columns.clone());
    for binding in body.results.bindings {
        let row = columns
            .iter()
            .map(|var| match binding.get(var) {
                None => Scalar::Null,
                Some(b) if var.ends_with("_signal_id") => b
                    .value
                    .parse::<i64>()
                    .map_or(Scalar::Null, Scalar::Int),
                Some(b) if var.ends_with("_is_ext_var") => match b.value.as_str() {
                    "true" | "1" => Scalar::Bool(true),
                    "false" | "0" => Scalar::Bool(false),
                    _ => Scalar::Null,
                },
                Some(b) => Scalar::Str(b.value.clone()),
            })
            .collect();
        frame.push_row(row);
    }
    frame
}
