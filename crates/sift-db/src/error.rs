//! Database error types for sift-db.

use sift_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The entity does not exist within the requested project.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Input rejected before touching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller must change project state before retrying.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A concurrent writer held the database past the retry budget, or the
    /// article changed underneath a read-modify-write.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether a caller may reasonably retry the same operation.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<CoreError> for DatabaseError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(message) => Self::Validation(message),
            CoreError::PreconditionFailed(message) => Self::PreconditionFailed(message),
            CoreError::InvalidTransition { .. } | CoreError::NotFound { .. } => {
                Self::InvalidState(error.to_string())
            }
            CoreError::Other(inner) => Self::Other(inner),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(error: serde_json::Error) -> Self {
        Self::Other(error.into())
    }
}
