//! The screening evaluator contract.
//!
//! An evaluator receives the article text, the review question and a
//! snapshot of the active criteria, and answers with a [`ScreeningResult`].
//! How it reaches the answer is its own business.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sift_core::entities::Criterion;
use sift_core::enums::{CriterionType, DecisionType, ScreeningStage};
use sift_core::evaluation::{AiCheckResult, CriteriaEvaluations, CriterionEvaluation};
use sift_core::inputs::{MAX_EXCLUSION_REASON_LEN, MAX_REASONING_LEN, NewDecision};

use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Criterion as shown to the evaluator. Taken once per screening run so later
/// edits never change what a running evaluation sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriterionSpec {
    pub code: String,
    pub criterion_type: CriterionType,
    pub description: String,
    pub rationale: Option<String>,
}

impl From<&Criterion> for CriterionSpec {
    fn from(criterion: &Criterion) -> Self {
        Self {
            code: criterion.code.clone(),
            criterion_type: criterion.criterion_type,
            description: criterion.description.clone(),
            rationale: criterion.rationale.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub article_text: String,
    pub review_question: String,
    pub criteria: Vec<CriterionSpec>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One criterion's verdict as reported by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriterionJudgement {
    /// Criterion code, e.g. `I1` or `E2`.
    pub criterion_code: String,
    pub criterion_type: CriterionType,
    /// For inclusion criteria: the article meets it. For exclusion criteria:
    /// the article triggers it. `null` when the text does not tell.
    pub met: Option<bool>,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub reasoning: String,
}

/// Structured answer of an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScreeningResult {
    pub decision: DecisionType,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub criteria_evaluations: Vec<CriterionJudgement>,
    /// Code of the most important exclusion criterion when excluding.
    #[serde(default)]
    pub primary_exclusion_reason: Option<String>,
    pub summary_reasoning: String,
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl ScreeningResult {
    /// Reject results that cannot be stored or that do not fit the criteria
    /// snapshot they were produced for.
    ///
    /// Every judgement must name a criterion of `criteria` with the same type.
    /// An `include` must report every inclusion criterion as met and no
    /// criterion as ruling the article out.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::MalformedOutput` describing the first problem.
    pub fn validate(&self, criteria: &[CriterionSpec]) -> Result<(), AgentError> {
        if !in_unit_range(self.confidence) {
            return Err(AgentError::MalformedOutput(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        for judgement in &self.criteria_evaluations {
            if !in_unit_range(judgement.confidence) {
                return Err(AgentError::MalformedOutput(format!(
                    "confidence {} for {} outside [0, 1]",
                    judgement.confidence, judgement.criterion_code
                )));
            }
            let Some(spec) = criteria.iter().find(|c| c.code == judgement.criterion_code) else {
                return Err(AgentError::MalformedOutput(format!(
                    "evaluation for unknown criterion {}",
                    judgement.criterion_code
                )));
            };
            if spec.criterion_type != judgement.criterion_type {
                return Err(AgentError::MalformedOutput(format!(
                    "criterion {} is {}, not {}",
                    spec.code, spec.criterion_type, judgement.criterion_type
                )));
            }
        }
        if self.decision == DecisionType::Include {
            if let Some(blocking) = self
                .criteria_evaluations
                .iter()
                .find(|j| j.as_evaluation().rules_out())
            {
                return Err(AgentError::MalformedOutput(format!(
                    "include contradicts criterion {}",
                    blocking.criterion_code
                )));
            }
            let unmet = criteria
                .iter()
                .filter(|c| c.criterion_type == CriterionType::Inclusion)
                .find(|c| {
                    !self
                        .criteria_evaluations
                        .iter()
                        .any(|j| j.criterion_code == c.code && j.met == Some(true))
                });
            if let Some(unmet) = unmet {
                return Err(AgentError::MalformedOutput(format!(
                    "include without inclusion criterion {} met",
                    unmet.code
                )));
            }
        }
        Ok(())
    }

    /// Per-criterion evaluations keyed by code.
    #[must_use]
    pub fn evaluations(&self) -> CriteriaEvaluations {
        self.criteria_evaluations
            .iter()
            .map(|j| (j.criterion_code.clone(), j.as_evaluation()))
            .collect()
    }

    /// The `ai_agent` decision this result records at `stage`.
    #[must_use]
    pub fn to_decision(&self, stage: ScreeningStage) -> NewDecision {
        let mut decision = NewDecision::ai(stage, self.decision)
            .with_confidence(self.confidence)
            .with_reasoning(truncate_chars(&self.summary_reasoning, MAX_REASONING_LEN))
            .with_evaluations(self.evaluations());
        if let Some(reason) = self.primary_exclusion_reason.as_deref() {
            decision = decision.with_exclusion_reason(truncate_chars(reason, MAX_EXCLUSION_REASON_LEN));
        }
        decision
    }

    /// Condensed form stored on the article.
    #[must_use]
    pub fn to_check_result(&self) -> AiCheckResult {
        AiCheckResult::Completed {
            decision: self.decision,
            confidence: self.confidence,
            summary: self.summary_reasoning.clone(),
            criteria_evaluations: self.evaluations(),
        }
    }
}

impl CriterionJudgement {
    fn as_evaluation(&self) -> CriterionEvaluation {
        CriterionEvaluation {
            criterion_type: self.criterion_type,
            met: self.met,
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Produces a screening judgement for one article.
#[async_trait]
pub trait ScreeningEvaluator: Send + Sync {
    /// Evaluate the article described by `request`.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ScreeningResult, AgentError>;
}
