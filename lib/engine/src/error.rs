//! Typed failures for the public entry point (spec §4.8, §7): the first
//! error unwinds straight to the caller, nothing is retried internally.

use hybridquery_model::BuildError;
use hybridquery_planner::PlanError;
use hybridquery_rewrite::EmitError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    #[error("algebra construction failed: {0}")]
    Build(#[from] BuildError),
    #[error("static query emission failed: {0}")]
    Emit(#[from] EmitError),
    #[error("time-series planning failed: {0}")]
    Plan(#[from] PlanError),
    #[error("RDF endpoint request failed: {0}")]
    Endpoint(String),
    #[error("time-series store request failed: {0}")]
    TimeSeries(String),
    #[error("column \"{0}\" not found in result frame")]
    ColumnNotFound(String),
    #[error("unsupported filter operator in integration: {0}")]
    UnsupportedFilterOp(String),
    #[error("{0} time-series request(s) were never consumed while building the result")]
    UnconsumedTsRequest(usize),
    #[error("frame operation failed: {0}")]
    Frame(#[from] hybridquery_frame::FrameError),
}

pub type QueryResult<T> = Result<T, QueryError>;
