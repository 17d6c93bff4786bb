#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    #[error("column \"{0}\" not found in frame")]
    UnknownColumn(String),
    #[error("join key column \"{0}\" not found in either frame")]
    UnknownJoinKey(String),
}

pub type FrameResult<T> = Result<T, FrameError>;
