/// Errors raised while serializing a rewritten algebra tree to SPARQL text
/// (spec §4.3, §4.8).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EmitError {
    #[error("literal with an explicit datatype is not supported by the static query emitter: \"{lexical}\"^^<{datatype}>")]
    UnsupportedLiteral { lexical: String, datatype: String },
    #[error("unsupported term in emitted query: {0}")]
    UnsupportedTerm(String),
}

pub type EmitResult<T> = Result<T, EmitError>;
