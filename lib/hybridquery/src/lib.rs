//! Single-dependency façade over the hybrid query splitter's internal
//! crates, in the shape of the teacher's `lib/rdf-fusion` aggregator:
//! downstream callers depend on `hybridquery` alone and reach every layer
//! through a namespaced module.

pub mod model {
    pub use hybridquery_model::*;
}

pub mod inference {
    pub use hybridquery_inference::*;
}

pub mod rewrite {
    pub use hybridquery_rewrite::*;
}

pub mod frame {
    pub use hybridquery_frame::*;
}

pub mod planner {
    pub use hybridquery_planner::*;
}

pub mod engine {
    pub use hybridquery_engine::*;
}

pub use engine::{
    HttpStaticStore, HttpTimeSeriesStore, HybridQueryEngine, HybridQueryEngineBuilder,
    QueryError, QueryResult, StaticStore, TimeSeriesStore,
};
