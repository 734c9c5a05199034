//! Error types for factor algebra and inference.

use thiserror::Error;

/// Errors raised by factor construction, the factor algebra and the elimination engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An algebra operation was applied to arguments it does not accept:
    /// a variable outside the factor scope, a join of disjoint scopes,
    /// or normalization of a factor with zero total mass.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A factor table violates a structural invariant.
    #[error("invalid factor: {0}")]
    InvalidFactor(String),
}

impl Error {
    pub(crate) fn op(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }

    pub(crate) fn factor(msg: impl Into<String>) -> Self {
        Error::InvalidFactor(msg.into())
    }
}

/// Result type for factor operations.
pub type Result<T> = std::result::Result<T, Error>;
