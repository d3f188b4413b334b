use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AiCheckStatus;
use crate::evaluation::AiCheckResult;
use crate::phase::ScreeningPhase;

/// A bibliographic record moving through the screening workflow.
///
/// The phase serializes flattened as `status`, `current_stage` and
/// `final_decision`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Article {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub publication_date: Option<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publication_type: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub pmcid: Option<String>,
    pub issn: Option<String>,
    pub keywords: Vec<String>,
    pub mesh_terms: Vec<String>,
    pub article_url: Option<String>,
    pub urls: Vec<String>,
    pub source_filename: Option<String>,
    pub full_text_path: Option<String>,
    pub has_full_text: bool,
    #[serde(flatten)]
    pub phase: ScreeningPhase,
    pub ai_check_status: AiCheckStatus,
    pub ai_check_result: Option<AiCheckResult>,
    pub last_ai_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
