//! AI screening agent configuration (Anthropic Messages API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_model() -> String {
    String::from("claude-sonnet-4-5")
}

fn default_base_url() -> String {
    String::from("https://api.anthropic.com")
}

/// Default per-article evaluation timeout in seconds.
const fn default_timeout_secs() -> u64 {
    120
}

const fn default_max_tokens() -> u32 {
    4096
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Anthropic API key.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on a single article evaluation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl AgentConfig {
    /// Check if an API key is available.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Require a usable configuration before issuing requests.
    pub fn require(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "agent".into(),
            });
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_tokens".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "agent.base_url".into(),
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Messages endpoint derived from `base_url`.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}
