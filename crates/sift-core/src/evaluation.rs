//! Typed per-criterion evaluations and the condensed AI check result.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{CriterionType, DecisionType};

/// One criterion's judgement inside a screening decision.
///
/// `met` is `None` when the available text does not allow a judgement.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriterionEvaluation {
    pub criterion_type: CriterionType,
    pub met: Option<bool>,
    pub confidence: f64,
    pub reasoning: String,
}

impl CriterionEvaluation {
    /// Whether this judgement on its own rules the article out.
    #[must_use]
    pub const fn rules_out(&self) -> bool {
        matches!(
            (self.criterion_type, self.met),
            (CriterionType::Inclusion, Some(false)) | (CriterionType::Exclusion, Some(true))
        )
    }
}

/// Criterion code → evaluation, ordered by code.
pub type CriteriaEvaluations = BTreeMap<String, CriterionEvaluation>;

/// Condensed outcome of the latest automated evaluation, stored on the article.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum AiCheckResult {
    Completed {
        decision: DecisionType,
        confidence: f64,
        summary: String,
        criteria_evaluations: CriteriaEvaluations,
    },
    Error {
        error: String,
    },
}

impl AiCheckResult {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
