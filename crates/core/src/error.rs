//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, ordering). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// Order-key bounds were not strictly increasing (`lower >= upper`).
    #[error("invalid order bounds: {0}")]
    InvalidOrderBounds(String),

    /// A persisted or supplied order key is not in the expected format.
    #[error("invalid order key: {0}")]
    InvalidOrderKey(String),

    /// No key could be generated for otherwise valid bounds.
    ///
    /// Unreachable for well-formed keys; surfaced as an internal failure.
    #[error("order key space exhausted: {0}")]
    OrderKeyExhausted(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_bounds(msg: impl Into<String>) -> Self {
        Self::InvalidOrderBounds(msg.into())
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidOrderKey(msg.into())
    }

    pub fn exhausted(msg: impl Into<String>) -> Self {
        Self::OrderKeyExhausted(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
