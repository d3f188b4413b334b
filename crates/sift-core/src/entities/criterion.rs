use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::CriterionType;

/// An inclusion or exclusion rule of a project.
///
/// `order` ranks criteria within the same project and type. Deactivated
/// criteria are kept so historical decisions still resolve their codes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Criterion {
    pub id: i64,
    pub project_id: i64,
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    pub code: String,
    pub description: String,
    pub rationale: Option<String>,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
