//! Local libSQL database configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_path() -> String {
    String::from(".sift/sift.db")
}

/// Default number of attempts when the database reports busy/locked.
const fn default_busy_retries() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file, relative paths resolve against the project root.
    #[serde(default = "default_path")]
    pub path: String,

    /// Attempts before a busy/locked database surfaces as a conflict.
    #[serde(default = "default_busy_retries")]
    pub busy_retries: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_retries: default_busy_retries(),
        }
    }
}

impl DatabaseConfig {
    /// Absolute database path for a project rooted at `root`.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.busy_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_retries".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
