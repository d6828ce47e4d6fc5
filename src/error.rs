//! Error types for the rule engine core

use thiserror::Error;

/// Main error type for the rule engine core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Cannot combine an empty list of rules")]
    EmptyInput,

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::DeserializationError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyTypeError, PyValueError};

        let msg = err.to_string();
        match err {
            RuleError::UnknownField(_) | RuleError::RuleNotFound(_) => PyKeyError::new_err(msg),
            RuleError::TypeMismatch(_) => PyTypeError::new_err(msg),
            RuleError::ParseError(_)
            | RuleError::InvalidCondition(_)
            | RuleError::UnknownOperator(_)
            | RuleError::EmptyInput
            | RuleError::DeserializationError(_)
            | RuleError::InvalidConfig(_)
            | RuleError::LimitExceeded(_) => PyValueError::new_err(msg),
        }
    }
}

/// Result type alias for the rule engine core
pub type Result<T> = std::result::Result<T, RuleError>;
