//! PubMed E-utilities settings used to fetch abstracts for CSV imports.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_base_url() -> String {
    String::from("https://eutils.ncbi.nlm.nih.gov/entrez/eutils")
}

const fn default_batch_size() -> usize {
    200
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PubMedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address sent with every request, as NCBI asks.
    #[serde(default)]
    pub email: Option<String>,

    /// NCBI API key. Raises the allowed request rate from 3 to 10 per second.
    #[serde(default)]
    pub api_key: Option<String>,

    /// PMIDs per efetch request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            email: None,
            api_key: None,
            batch_size: default_batch_size(),
        }
    }
}

impl PubMedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "pubmed.batch_size".into(),
                reason: format!("{} is not between 1 and 10000", self.batch_size),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "pubmed.base_url".into(),
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }

    /// Minimum spacing between requests for the configured key.
    #[must_use]
    pub fn request_interval(&self) -> Duration {
        if self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty()) {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(334)
        }
    }

    /// efetch endpoint derived from `base_url`.
    #[must_use]
    pub fn efetch_url(&self) -> String {
        format!("{}/efetch.fcgi", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_shortens_request_interval() {
        let anonymous = PubMedConfig::default();
        let keyed = PubMedConfig {
            api_key: Some("ncbi-key".into()),
            ..PubMedConfig::default()
        };
        assert!(keyed.request_interval() < anonymous.request_interval());
        assert_eq!(
            anonymous.efetch_url(),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi"
        );
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = PubMedConfig {
            batch_size: 0,
            ..PubMedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
