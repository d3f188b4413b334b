//! Status, stage, decision, and audit enums for Sift.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the string stored in SQL. `ArticleStatus` carries
//! its transition graph through `allowed_next_states()`; the authoritative
//! transition function lives in [`crate::phase`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ArticleStatus
// ---------------------------------------------------------------------------

/// Workflow status of an article.
///
/// ```text
/// imported → screening → awaiting_full_text → full_text_retrieved → included
///          ↘           ↘ excluded           ↘ included / excluded  ↘ excluded
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Imported,
    Screening,
    AwaitingFullText,
    FullTextRetrieved,
    Included,
    Excluded,
}

impl ArticleStatus {
    pub const ALL: [Self; 6] = [
        Self::Imported,
        Self::Screening,
        Self::AwaitingFullText,
        Self::FullTextRetrieved,
        Self::Included,
        Self::Excluded,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Imported => &[Self::Screening, Self::AwaitingFullText, Self::Excluded],
            Self::Screening => &[Self::AwaitingFullText, Self::Excluded],
            Self::AwaitingFullText => &[Self::FullTextRetrieved, Self::Included, Self::Excluded],
            Self::FullTextRetrieved => &[Self::Included, Self::Excluded],
            Self::Included | Self::Excluded => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Included | Self::Excluded)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::Screening => "screening",
            Self::AwaitingFullText => "awaiting_full_text",
            Self::FullTextRetrieved => "full_text_retrieved",
            Self::Included => "included",
            Self::Excluded => "excluded",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScreeningStage
// ---------------------------------------------------------------------------

/// Stage of the two-pass review an article (or a decision) belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStage {
    TitleAbstract,
    FullText,
    Completed,
}

impl ScreeningStage {
    /// Whether a decision may be recorded against this stage.
    #[must_use]
    pub const fn accepts_decisions(self) -> bool {
        !matches!(self, Self::Completed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TitleAbstract => "title_abstract",
            Self::FullText => "full_text",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ScreeningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FinalDecision
// ---------------------------------------------------------------------------

/// Final outcome of an article's review. Only non-pending once completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    Pending,
    Included,
    Excluded,
}

impl FinalDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Included => "included",
            Self::Excluded => "excluded",
        }
    }
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionType
// ---------------------------------------------------------------------------

/// Verdict carried by a single screening decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Include,
    Exclude,
    Uncertain,
}

impl DecisionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionSource
// ---------------------------------------------------------------------------

/// Who produced a screening decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Human,
    AiAgent,
}

impl DecisionSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::AiAgent => "ai_agent",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CriterionType
// ---------------------------------------------------------------------------

/// Whether a criterion must be met (inclusion) or must not be met (exclusion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CriterionType {
    Inclusion,
    Exclusion,
}

impl CriterionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inclusion => "inclusion",
            Self::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AiCheckStatus
// ---------------------------------------------------------------------------

/// Outcome of the most recent automated evaluation of an article.
///
/// ```text
/// pending → completed
///         → error → completed (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiCheckStatus {
    Pending,
    Completed,
    Error,
}

impl AiCheckStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AiCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UncertainPolicy
// ---------------------------------------------------------------------------

/// How next-article selection treats articles whose only decisions at the
/// current stage are `uncertain`.
///
/// - `Strict`: any decision at the stage removes the article from the queue.
/// - `RequeueLast`: uncertain-only articles stay eligible, after every
///   article that has never been decided at the stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UncertainPolicy {
    #[default]
    Strict,
    RequeueLast,
}

impl UncertainPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::RequeueLast => "requeue_last",
        }
    }
}

impl fmt::Display for UncertainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    DecisionRecorded,
    AiChecked,
    Reordered,
    Imported,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::DecisionRecorded => "decision_recorded",
            Self::AiChecked => "ai_checked",
            Self::Reordered => "reordered",
            Self::Imported => "imported",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity in the system, used in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Article,
    Criterion,
    Decision,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Article => "article",
            Self::Criterion => "criterion",
            Self::Decision => "decision",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- Serde roundtrip tests ---

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(
        status_awaiting_full_text,
        ArticleStatus,
        ArticleStatus::AwaitingFullText,
        "awaiting_full_text"
    );
    test_serde_roundtrip!(
        status_full_text_retrieved,
        ArticleStatus,
        ArticleStatus::FullTextRetrieved,
        "full_text_retrieved"
    );
    test_serde_roundtrip!(
        stage_title_abstract,
        ScreeningStage,
        ScreeningStage::TitleAbstract,
        "title_abstract"
    );
    test_serde_roundtrip!(
        source_ai_agent,
        DecisionSource,
        DecisionSource::AiAgent,
        "ai_agent"
    );
    test_serde_roundtrip!(
        policy_requeue_last,
        UncertainPolicy,
        UncertainPolicy::RequeueLast,
        "requeue_last"
    );
    test_serde_roundtrip!(
        audit_decision_recorded,
        AuditAction,
        AuditAction::DecisionRecorded,
        "decision_recorded"
    );

    // --- Display matches as_str ---

    #[test]
    fn display_matches_storage_string() {
        for status in ArticleStatus::ALL {
            assert_eq!(status.to_string(), status.as_str());
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(DecisionType::Uncertain.to_string(), "uncertain");
        assert_eq!(FinalDecision::Pending.to_string(), "pending");
        assert_eq!(AiCheckStatus::Error.to_string(), "error");
    }

    // --- State machine ---

    #[test]
    fn terminal_statuses_have_no_successors() {
        assert!(ArticleStatus::Included.allowed_next_states().is_empty());
        assert!(ArticleStatus::Excluded.allowed_next_states().is_empty());
        assert!(ArticleStatus::Included.is_terminal());
        assert!(!ArticleStatus::FullTextRetrieved.is_terminal());
    }

    #[test]
    fn screening_cannot_jump_to_included() {
        assert!(!ArticleStatus::Screening.can_transition_to(ArticleStatus::Included));
        assert!(ArticleStatus::Screening.can_transition_to(ArticleStatus::AwaitingFullText));
        assert!(ArticleStatus::AwaitingFullText.can_transition_to(ArticleStatus::Included));
    }

    #[test]
    fn completed_stage_rejects_decisions() {
        assert!(!ScreeningStage::Completed.accepts_decisions());
        assert!(ScreeningStage::FullText.accepts_decisions());
    }

    #[test]
    fn uncertain_policy_defaults_to_strict() {
        assert_eq!(UncertainPolicy::default(), UncertainPolicy::Strict);
    }
}
