use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Numeric degenerate: {0}")]
    NumericDegenerate(String),
}
