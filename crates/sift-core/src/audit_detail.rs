//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! give the common shapes a schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ArticleStatus, DecisionSource, DecisionType, ScreeningStage};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: ArticleStatus,
    pub to: ArticleStatus,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::DecisionRecorded`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DecisionRecordedDetail {
    pub decision_id: i64,
    pub stage: ScreeningStage,
    pub decision: DecisionType,
    pub source: DecisionSource,
    /// False when the decision's stage did not match the article's stage.
    pub applied: bool,
}

/// Detail for `AuditAction::Reordered`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReorderedDetail {
    pub from: i64,
    pub to: i64,
}

/// Detail for `AuditAction::Imported`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportedDetail {
    pub source_filename: Option<String>,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}
