#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PlanError {
    #[error("timestamp triple's object must be a variable, got: {0}")]
    UnsupportedTimestampBinding(String),
    #[error("expected signal id column \"{0}\" in the static result frame")]
    MissingSignalIdColumn(String),
}

pub type PlanResult<T> = Result<T, PlanError>;
