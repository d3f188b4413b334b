//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer failed to parse or a value has the wrong type.
    #[error("failed to load sift configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A section needed by the requested operation has no usable values.
    #[error("[{section}] is not configured; set it in .sift/config.toml or SIFT_{}__* variables", .section.to_uppercase())]
    NotConfigured { section: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
