//! Generation and request errors
//!
//! `GenerationError` aborts a run and yields no sequence. `RequestError`
//! rejects a request before any step is taken. Early termination (divergence,
//! convergence, cycles) is not an error; see `Termination`.

use stepseq_core::{EvalError, Number, NumberError, NumericMode};
use thiserror::Error;

/// Machine-readable codes for generation failures
pub mod codes {
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const CUSTOM_EVAL: &str = "CUSTOM_EVAL";
    pub const ARITHMETIC: &str = "ARITHMETIC";
}

/// Fatal failure of a generation run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    #[error("Error evaluating custom function '{expression}': {cause}")]
    CustomEvaluation {
        expression: String,
        #[source]
        cause: EvalError,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(NumberError),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::DivisionByZero => codes::DIV_ZERO,
            GenerationError::CustomEvaluation { .. } => codes::CUSTOM_EVAL,
            GenerationError::Arithmetic(_) => codes::ARITHMETIC,
        }
    }
}

impl From<NumberError> for GenerationError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::DivisionByZero => GenerationError::DivisionByZero,
            other => GenerationError::Arithmetic(other),
        }
    }
}

/// Precondition failure while building a request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Sequence length must be a positive integer")]
    ZeroLength,

    #[error("No operation given")]
    MissingOperation,

    #[error("Operation '{operation}' requires {what}")]
    MissingOperand {
        operation: &'static str,
        what: &'static str,
    },

    #[error("Custom function must use '{placeholder}' for the previous number")]
    MissingPlaceholder { placeholder: &'static str },

    #[error("Invalid custom function '{expression}': {cause}")]
    InvalidExpression {
        expression: String,
        #[source]
        cause: EvalError,
    },

    #[error("Invalid {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        #[source]
        source: NumberError,
    },

    #[error("{field} {value} is not a {mode} value")]
    ModeMismatch {
        field: &'static str,
        value: Number,
        mode: NumericMode,
    },

    #[error("Upper bound {upper} is below lower bound {lower}")]
    InvertedBounds { upper: Number, lower: Number },

    #[error("Unknown operation '{0}'. Choose from add, subtract, multiply, divide, custom")]
    UnknownOperation(String),
}
