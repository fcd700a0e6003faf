//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Covers deterministic failures on the client side (bad arguments, unknown
/// identifiers). Gateway/transport failures live in `pharmloc-gateway`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. page size of zero).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. empty section code, row out of range).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested zone or record is not known to the client.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
