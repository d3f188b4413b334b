//! Input payloads validated before they reach storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{CriterionType, DecisionSource, DecisionType, ScreeningStage};
use crate::errors::CoreError;
use crate::evaluation::CriteriaEvaluations;

pub const MAX_CODE_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_RATIONALE_LEN: usize = 1000;
pub const MAX_REASONING_LEN: usize = 2000;
pub const MAX_EXCLUSION_REASON_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub review_question: Option<String>,
    pub owner_id: Option<i64>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("project name must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// Bibliographic payload produced by an import parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewArticle {
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
}

impl NewArticle {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("article title must not be empty".into()));
        }
        Ok(())
    }
}

/// Identifier used to match an imported record against stored articles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    Doi,
    Pmid,
}

impl DedupKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::Pmid => "pmid",
        }
    }

    /// The record's non-blank value for this key.
    #[must_use]
    pub fn value_of(self, article: &NewArticle) -> Option<&str> {
        let value = match self {
            Self::Doi => article.doi.as_deref(),
            Self::Pmid => article.pmid.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewCriterion {
    pub criterion_type: CriterionType,
    pub code: String,
    pub description: String,
    pub rationale: Option<String>,
    /// `None` or `Some(0)` appends after the last criterion of the same type.
    pub order: Option<i64>,
    pub is_active: bool,
}

impl NewCriterion {
    #[must_use]
    pub fn new(
        criterion_type: CriterionType,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            criterion_type,
            code: code.into(),
            description: description.into(),
            rationale: None,
            order: None,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_code(&self.code)?;
        validate_description(&self.description)?;
        validate_rationale(self.rationale.as_deref())
    }

    /// The explicit order to store, if the caller supplied a usable one.
    #[must_use]
    pub fn explicit_order(&self) -> Option<i64> {
        self.order.filter(|order| *order != 0)
    }
}

pub fn validate_code(code: &str) -> Result<(), CoreError> {
    check_len("code", code, 1, MAX_CODE_LEN)
}

pub fn validate_description(description: &str) -> Result<(), CoreError> {
    check_len("description", description, 1, MAX_DESCRIPTION_LEN)
}

pub fn validate_rationale(rationale: Option<&str>) -> Result<(), CoreError> {
    rationale.map_or(Ok(()), |value| {
        check_len("rationale", value, 0, MAX_RATIONALE_LEN)
    })
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// A screening judgement to be logged and applied to an article.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewDecision {
    pub stage: ScreeningStage,
    pub decision: DecisionType,
    pub source: DecisionSource,
    pub reviewer_id: Option<i64>,
    pub confidence_score: Option<f64>,
    pub reasoning: Option<String>,
    pub primary_exclusion_reason: Option<String>,
    pub criteria_evaluations: Option<CriteriaEvaluations>,
}

impl NewDecision {
    /// A human reviewer's decision.
    #[must_use]
    pub const fn human(stage: ScreeningStage, decision: DecisionType, reviewer_id: i64) -> Self {
        Self {
            stage,
            decision,
            source: DecisionSource::Human,
            reviewer_id: Some(reviewer_id),
            confidence_score: None,
            reasoning: None,
            primary_exclusion_reason: None,
            criteria_evaluations: None,
        }
    }

    /// An automated evaluator's decision. Never carries a reviewer.
    #[must_use]
    pub const fn ai(stage: ScreeningStage, decision: DecisionType) -> Self {
        Self {
            stage,
            decision,
            source: DecisionSource::AiAgent,
            reviewer_id: None,
            confidence_score: None,
            reasoning: None,
            primary_exclusion_reason: None,
            criteria_evaluations: None,
        }
    }

    #[must_use]
    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    #[must_use]
    pub fn with_exclusion_reason(mut self, reason: impl Into<String>) -> Self {
        self.primary_exclusion_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_evaluations(mut self, evaluations: CriteriaEvaluations) -> Self {
        self.criteria_evaluations = Some(evaluations);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.stage.accepts_decisions() {
            return Err(CoreError::Validation(format!(
                "decisions cannot be recorded at stage {}",
                self.stage
            )));
        }
        match (self.source, self.reviewer_id) {
            (DecisionSource::AiAgent, Some(_)) => {
                return Err(CoreError::Validation(
                    "ai_agent decisions must not carry a reviewer_id".into(),
                ));
            }
            (DecisionSource::Human, None) => {
                return Err(CoreError::Validation(
                    "human decisions require a reviewer_id".into(),
                ));
            }
            _ => {}
        }
        if let Some(confidence) = self.confidence_score {
            validate_confidence(confidence)?;
        }
        if let Some(reasoning) = &self.reasoning {
            check_len("reasoning", reasoning, 0, MAX_REASONING_LEN)?;
        }
        if let Some(reason) = &self.primary_exclusion_reason {
            check_len("primary_exclusion_reason", reason, 0, MAX_EXCLUSION_REASON_LEN)?;
        }
        if let Some(evaluations) = &self.criteria_evaluations {
            for evaluation in evaluations.values() {
                validate_confidence(evaluation.confidence)?;
            }
        }
        Ok(())
    }
}

pub fn validate_confidence(confidence: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "confidence must be within [0, 1], got {confidence}"
        )))
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(CoreError::Validation(format!(
            "{field} length must be within {min}..={max}, got {len}"
        )));
    }
    Ok(())
}
