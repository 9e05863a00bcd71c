//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic failures only. Transport concerns belong to the crates that
/// own the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
