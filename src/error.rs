use thiserror::Error;

// Unified error type for densol

#[derive(Error, Debug)]
pub enum LinError {
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("singular operator")]
    SingularOperator,
    #[error("operator is not positive definite")]
    NotPositiveDefinite,
    #[error("iteration did not converge: {0}")]
    ConvergenceFailure(&'static str),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
