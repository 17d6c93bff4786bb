//! Static/time-series executors and the integrated result builder that
//! together implement the hybrid query splitter's public entry point.

mod api;
mod error;
mod result_builder;
mod static_executor;
mod ts_executor;

pub use api::{HybridQueryEngine, HybridQueryEngineBuilder};
pub use error::{QueryError, QueryResult};
pub use static_executor::{HttpStaticStore, StaticStore};
pub use ts_executor::{HttpTimeSeriesStore, TimeSeriesStore};
