//! Agent error types.

use sift_db::error::DatabaseError;
use thiserror::Error;

/// Errors from AI screening.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The evaluator itself reported a failure.
    #[error("evaluator failed: {0}")]
    Evaluator(String),

    /// The evaluator did not answer within the configured bound.
    #[error("evaluator timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The evaluator answered, but not with a usable screening result.
    #[error("malformed evaluator output: {0}")]
    MalformedOutput(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model API returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The project is not ready for AI screening.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The evaluator is not configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AgentError {
    /// Whether this error is an evaluator failure, as opposed to a
    /// precondition or storage problem.
    #[must_use]
    pub const fn is_evaluator_failure(&self) -> bool {
        matches!(
            self,
            Self::Evaluator(_)
                | Self::Timeout { .. }
                | Self::MalformedOutput(_)
                | Self::Http(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
        )
    }
}

impl From<sift_config::ConfigError> for AgentError {
    fn from(error: sift_config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}
