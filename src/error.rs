//! Error types
use crate::linalg::SingularMatrixError;
use thiserror::Error;

/// Error from a policy search episode or batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PowerError {
    #[error("degenerate weight at step {step}: quadratic form {quadratic_form} is (near) zero")]
    DegenerateWeight { step: usize, quadratic_form: f64 },
    #[error("batch weight matrix is not invertible")]
    SingularAggregate(#[from] SingularMatrixError),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Error from the training loop.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("training stopped at update {iteration}")]
pub struct TrainError {
    /// Index of the update that failed (0-based).
    pub iteration: usize,
    #[source]
    pub source: PowerError,
}
