//! Error types for the model evaluator

use thiserror::Error;

/// Result type alias for evaluator operations
pub type Result<T> = std::result::Result<T, EvaluatorError>;

/// Main error type.
///
/// Variants fall into two groups: fatal errors end the session before any
/// evaluation round runs, everything else is local to a single round.
#[derive(Error, Debug)]
pub enum EvaluatorError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Target column '{0}' not found in the dataset")]
    TargetNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    #[error("Numeric error: {0}")]
    NumericError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EvaluatorError {
    /// Whether the error must end the whole session.
    ///
    /// Only problems with the dataset itself are fatal; a bad model choice or a
    /// numeric failure inside one round lets the session continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EvaluatorError::DataError(_) | EvaluatorError::TargetNotFound(_)
        )
    }
}

impl From<polars::error::PolarsError> for EvaluatorError {
    fn from(err: polars::error::PolarsError) -> Self {
        EvaluatorError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for EvaluatorError {
    fn from(err: serde_json::Error) -> Self {
        EvaluatorError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for EvaluatorError {
    fn from(err: bincode::Error) -> Self {
        EvaluatorError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EvaluatorError {
    fn from(err: ndarray::ShapeError) -> Self {
        EvaluatorError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvaluatorError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");

        let err = EvaluatorError::TargetNotFound("Price".to_string());
        assert_eq!(err.to_string(), "Target column 'Price' not found in the dataset");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EvaluatorError = io_err.into();
        assert!(matches!(err, EvaluatorError::IoError(_)));
    }

    #[test]
    fn test_fatality() {
        assert!(EvaluatorError::TargetNotFound("y".into()).is_fatal());
        assert!(EvaluatorError::DataError("empty".into()).is_fatal());
        assert!(!EvaluatorError::UnknownModel("foo".into()).is_fatal());
        assert!(!EvaluatorError::NumericError("bins".into()).is_fatal());
        assert!(!EvaluatorError::ModelNotFitted.is_fatal());
    }
}
