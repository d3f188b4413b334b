//! Cross-cutting error types for Sift.
//!
//! Domain-specific errors (`DatabaseError`, `AgentError`, `ImportError`) are
//! defined in their respective crates and converge in `sift-cli` via `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any Sift crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result, or the entity belongs to another project.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// The operation cannot run until the caller fixes some project state.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Data failed validation (schema, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
