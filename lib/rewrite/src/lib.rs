//! Static rewriter and SPARQL text emitter for the hybrid query splitter
//! (spec §4.2, §4.3).

mod emitter;
mod error;
mod rewriter;

pub use emitter::emit_query;
pub use error::{EmitError, EmitResult};
pub use rewriter::{rewrite, IS_EXTERNAL_VALUE_URI, SIGNAL_ID_URI};
