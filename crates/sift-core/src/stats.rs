//! Read-only screening counters, always recomputed from current state.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ArticleStatus, ScreeningStage};

/// Project-wide screening progress.
///
/// `screened_*` count distinct articles with at least one decision at that
/// stage, so they may exceed the number of articles currently at the stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScreeningStats {
    pub total_articles: u64,
    pub screened_title_abstract: u64,
    pub screened_full_text: u64,
    pub included: u64,
    pub excluded: u64,
    /// Open articles whose latest decision at their current stage is `uncertain`.
    pub uncertain: u64,
    pub awaiting_screening: u64,
    pub awaiting_full_text: u64,
    pub by_status: BTreeMap<ArticleStatus, u64>,
}

impl ScreeningStats {
    /// Count for one status, zero when absent.
    #[must_use]
    pub fn status_count(&self, status: ArticleStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Article counts grouped by status and by current stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ArticleStats {
    pub total: u64,
    pub by_status: BTreeMap<ArticleStatus, u64>,
    pub by_stage: BTreeMap<ScreeningStage, u64>,
}
