//! # sift-config
//!
//! Layered configuration loading for Sift using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SIFT_*` prefix, `__` as separator)
//! 2. Project-level `.sift/config.toml`
//! 3. User-level `~/.config/sift/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SIFT_AGENT__API_KEY` -> `agent.api_key`,
//! `SIFT_SCREENING__UNCERTAIN_POLICY` -> `screening.uncertain_policy`,
//! `SIFT_PUBMED__EMAIL` -> `pubmed.email`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use sift_config::SiftConfig;
//!
//! let config = SiftConfig::load_with_dotenv(std::path::Path::new(".")).expect("config");
//! if config.agent.is_configured() {
//!     println!("model: {}", config.agent.model);
//! }
//! ```

mod agent;
mod database;
mod error;
mod general;
mod pubmed;
mod screening;

pub use agent::AgentConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use pubmed::PubMedConfig;
pub use screening::ScreeningConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Directory holding project-local state and configuration.
pub const PROJECT_DIR: &str = ".sift";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiftConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub screening: ScreeningConfig,
    #[serde(default)]
    pub pubmed: PubMedConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl SiftConfig {
    /// Load configuration for the project rooted at `root`.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(root).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Reads `<root>/.env` when present, otherwise falls back to the `.env`
    /// discovered from the current directory.
    pub fn load_with_dotenv(root: &Path) -> Result<Self, ConfigError> {
        let env_path = root.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        } else {
            let _ = dotenvy::dotenv();
        }
        Self::load(root)
    }

    /// Build the figment provider chain for a project root.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment(root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = Self::project_config_path(root);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("SIFT_").split("__"))
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.agent.validate()?;
        self.pubmed.validate()?;
        if self.general.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.default_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join("config.toml")
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sift").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::enums::UncertainPolicy;

    #[test]
    fn default_config_loads() {
        let config = SiftConfig::default();
        assert!(!config.agent.is_configured());
        assert_eq!(config.screening.uncertain_policy, UncertainPolicy::Strict);
        assert_eq!(config.database.busy_retries, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn figment_builds_without_files() {
        let figment = SiftConfig::figment(Path::new("/nonexistent-sift-root"));
        let config: SiftConfig = figment.extract().expect("should extract defaults");
        assert_eq!(config.general.default_limit, 20);
        assert_eq!(config.agent.model, "claude-sonnet-4-5");
    }
}
