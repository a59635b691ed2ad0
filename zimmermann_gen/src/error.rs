// Error taxonomy for the generative core.
//
// Only malformed input and unusable loop shapes are errors. An empty solver
// result is a normal outcome, and an out-of-range pulse trajectory is logged
// rather than raised (see pulse.rs).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("degenerate loop: cardinalities sum to zero")]
    DegenerateLoop,
    #[error("selection {index} out of range ({available} available)")]
    SelectionOutOfRange { index: usize, available: usize },
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;

impl GenError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        GenError::InvalidArgument(msg.into())
    }
}
