// common/src/error.rs
// Error taxonomy shared across the tracker and chat services (spec §7).

use thiserror::Error;

/// Domain-level error taxonomy. HTTP boundaries in each service map these
/// onto status codes; nothing in here knows about axum or JSON bodies.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotExists(String),

    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("permanent upstream failure: {0}")]
    Permanent(String),

    #[error("circuit open")]
    CircuitOpen,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DomainError {
    /// Short machine-readable name, used in HTTP error bodies' `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "StatusBadRequest",
            DomainError::AlreadyExists(_) => "StatusConflict",
            DomainError::NotExists(_) => "StatusNotFound",
            DomainError::Transient(_) => "StatusInternalServerError",
            DomainError::Permanent(_) => "StatusInternalServerError",
            DomainError::CircuitOpen => "StatusInternalServerError",
            DomainError::Other(_) => "StatusInternalServerError",
        }
    }
}
