//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures caused by caller input.
/// Runtime and storage concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A submission is missing one or more required fields.
    #[error("missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn missing_fields(missing: Vec<&'static str>) -> Self {
        Self::Validation { missing }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Fields reported as missing, empty for other variants.
    pub fn missing(&self) -> &[&'static str] {
        match self {
            DomainError::Validation { missing } => missing,
            DomainError::InvalidId(_) => &[],
        }
    }
}
