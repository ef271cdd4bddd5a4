//! Domain error types
//!
//! Every collaboration operation reports failure through [`CollabError`].
//! The variants form a closed taxonomy; callers map [`CollabError::code`]
//! onto their own transport-level status codes.

use serde::Serialize;
use thiserror::Error;

/// Collaboration errors, returned from every public operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollabError {
    /// A referenced workspace, comment, proposal, DTU or session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input (empty text, invalid role, empty change set, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Duplicate membership
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is not allowed to perform this mutation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Workspace member cap reached
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The entity is not in a state that permits the operation
    #[error("Invalid state: {0}")]
    StateError(String),
}

impl CollabError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        CollabError::NotFound(format!("{} '{}' does not exist", kind, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CollabError::Validation(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        CollabError::StateError(message.into())
    }

    /// Stable reason code for this error
    pub fn code(&self) -> &'static str {
        match self {
            CollabError::NotFound(_) => "not_found",
            CollabError::Validation(_) => "validation",
            CollabError::Conflict(_) => "conflict",
            CollabError::Forbidden(_) => "forbidden",
            CollabError::CapacityExceeded(_) => "capacity_exceeded",
            CollabError::StateError(_) => "state_error",
        }
    }

    /// Human-readable detail without the category prefix
    pub fn message(&self) -> &str {
        match self {
            CollabError::NotFound(m)
            | CollabError::Validation(m)
            | CollabError::Conflict(m)
            | CollabError::Forbidden(m)
            | CollabError::CapacityExceeded(m)
            | CollabError::StateError(m) => m,
        }
    }

    /// Failure payload in the `{ ok: false, error: <code> }` shape
    pub fn to_failure(&self) -> Failure {
        Failure {
            ok: false,
            error: self.code(),
            message: self.message().to_string(),
        }
    }
}

/// Serializable failure record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub ok: bool,
    pub error: &'static str,
    pub message: String,
}

/// Result alias used throughout the collaboration engine
pub type CollabResult<T> = Result<T, CollabError>;
