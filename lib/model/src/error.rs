/// Errors raised while parsing SPARQL text into an [`crate::Operator`] tree.
///
/// Follows the teacher's (`tobixdev-rdf-fusion`) `thiserror`-based error
/// style (`lib/model/src/error.rs`, `lib/common/src/error.rs`): fieldful
/// variants carry the offending name so the caller never has to guess what
/// broke (spec §7: "an error carrying the offending URI/variable/operator
/// name").
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("failed to parse SPARQL query: {0}")]
    Syntax(#[from] spargebra::SparqlSyntaxError),
    #[error("only SELECT queries are supported, found a {0} query")]
    UnsupportedOperator(&'static str),
    #[error("unsupported graph pattern operator: {0}")]
    UnsupportedPattern(&'static str),
    #[error("unsupported property path shape on verb of subject/object pair")]
    UnsupportedPath,
    #[error("unsupported expression shape: {0}")]
    UnsupportedExpression(String),
    #[error("unsupported term: {0}")]
    UnsupportedTerm(String),
    #[error("invalid IRI: {0}")]
    InvalidIri(#[from] oxiri::IriParseError),
}

pub type BuildResult<T> = Result<T, BuildError>;
