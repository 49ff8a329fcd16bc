use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoxError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoxError {
    #[error("survival data is broken: {message}")]
    InvalidInput { message: String },

    #[error("linear predictor has length {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("numerical issues: {message}")]
    NumericalError { message: String },
}

impl CoxError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    pub fn numerical_error(message: impl Into<String>) -> Self {
        Self::NumericalError { message: message.into() }
    }
}
