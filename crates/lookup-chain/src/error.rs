//! Error types for lookup-chain

use lookup_chain_expr::ExprError;
use thiserror::Error;

/// Result type alias using [`ChainError`]
pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Errors that can occur while building, resolving or persisting statements
#[derive(Debug, Error)]
pub enum ChainError {
    /// Parse, assembly or evaluation failure
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A call level of the tree has no matched call text
    #[error("Tree level {0} has no matched call expression")]
    MissingMatch(usize),

    /// Unknown resolution strategy name
    #[error("Invalid resolve strategy: {0}")]
    InvalidStrategy(String),

    /// Unknown series type tag
    #[error("Invalid series type: {0}")]
    InvalidSeries(String),

    /// Store file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
