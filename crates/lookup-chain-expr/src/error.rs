//! Expression error types

use thiserror::Error;

/// Result type for expression operations
pub type ExprResult<T> = std::result::Result<T, ExprError>;

/// Errors that can occur while parsing, assembling or evaluating expressions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    /// Text could not be parsed into the supported grammar
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// An identifier or function could not be resolved
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A node kind the assembler cannot serialize
    #[error("Unsupported expression shape: {0}")]
    Shape(String),

    /// Evaluation failed on a resolved expression
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },
}
