use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{DecisionSource, DecisionType, ScreeningStage};
use crate::evaluation::CriteriaEvaluations;

/// One logged screening judgement. Never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScreeningDecision {
    pub id: i64,
    pub article_id: i64,
    pub reviewer_id: Option<i64>,
    pub stage: ScreeningStage,
    pub decision: DecisionType,
    pub source: DecisionSource,
    pub confidence_score: Option<f64>,
    pub reasoning: Option<String>,
    pub primary_exclusion_reason: Option<String>,
    pub criteria_evaluations: Option<CriteriaEvaluations>,
    pub created_at: DateTime<Utc>,
}
