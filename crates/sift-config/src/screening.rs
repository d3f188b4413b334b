//! Screening workflow policy.

use serde::{Deserialize, Serialize};
use sift_core::enums::UncertainPolicy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScreeningConfig {
    /// Whether uncertain-only articles are offered again by next-article selection.
    #[serde(default)]
    pub uncertain_policy: UncertainPolicy,
}
