//! Term/Triple/Operator data model for the hybrid graph/time-series query
//! splitter, plus the builder that turns a parsed SPARQL query into it.

mod builder;
mod error;
mod operator;
mod term;
mod triple;

pub use builder::build_from_sparql;
pub use error::{BuildError, BuildResult};
pub use operator::{Operator, OperatorKind};
pub use term::{Constraint, PathModifier, TermArena, TermId, TermValue};
pub use triple::{Expression, RelationalOp, Triple};
