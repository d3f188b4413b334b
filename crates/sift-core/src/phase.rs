//! The screening phase machine.
//!
//! An article's position in the workflow is a single [`ScreeningPhase`].
//! Status, current stage, and final decision are derived views of it, so the
//! three can never disagree. [`ScreeningPhase::next`] is the pure transition
//! function on `(stage, decision)`:
//!
//! ```text
//! title_abstract + include   → full_text (awaiting retrieval)
//! title_abstract + exclude   → completed / excluded
//! full_text      + include   → completed / included
//! full_text      + exclude   → completed / excluded
//! any            + uncertain → unchanged
//! completed      + any       → unchanged
//! ```

use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

use crate::enums::{ArticleStatus, DecisionType, FinalDecision, ScreeningStage};

/// Terminal outcome of a completed review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Included,
    Excluded,
}

/// Where an article sits in the two-stage workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "PhaseView", try_from = "PhaseView")]
pub enum ScreeningPhase {
    /// Title/abstract screening. `started` is false until the project
    /// explicitly opens screening for the article.
    TitleAbstract { started: bool },
    /// Full-text screening. `retrieved` flips once a document is attached.
    FullText { retrieved: bool },
    Completed(Verdict),
}

impl Default for ScreeningPhase {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl ScreeningPhase {
    /// Phase of a freshly imported article.
    pub const INITIAL: Self = Self::TitleAbstract { started: false };

    #[must_use]
    pub const fn status(self) -> ArticleStatus {
        match self {
            Self::TitleAbstract { started: false } => ArticleStatus::Imported,
            Self::TitleAbstract { started: true } => ArticleStatus::Screening,
            Self::FullText { retrieved: false } => ArticleStatus::AwaitingFullText,
            Self::FullText { retrieved: true } => ArticleStatus::FullTextRetrieved,
            Self::Completed(Verdict::Included) => ArticleStatus::Included,
            Self::Completed(Verdict::Excluded) => ArticleStatus::Excluded,
        }
    }

    #[must_use]
    pub const fn stage(self) -> ScreeningStage {
        match self {
            Self::TitleAbstract { .. } => ScreeningStage::TitleAbstract,
            Self::FullText { .. } => ScreeningStage::FullText,
            Self::Completed(_) => ScreeningStage::Completed,
        }
    }

    #[must_use]
    pub const fn final_decision(self) -> FinalDecision {
        match self {
            Self::Completed(Verdict::Included) => FinalDecision::Included,
            Self::Completed(Verdict::Excluded) => FinalDecision::Excluded,
            Self::TitleAbstract { .. } | Self::FullText { .. } => FinalDecision::Pending,
        }
    }

    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Pure transition on the phase's own stage.
    #[must_use]
    pub const fn next(self, decision: DecisionType) -> Self {
        match (self, decision) {
            (Self::TitleAbstract { .. }, DecisionType::Include) => {
                Self::FullText { retrieved: false }
            }
            (Self::TitleAbstract { .. } | Self::FullText { .. }, DecisionType::Exclude) => {
                Self::Completed(Verdict::Excluded)
            }
            (Self::FullText { .. }, DecisionType::Include) => Self::Completed(Verdict::Included),
            (_, DecisionType::Uncertain) | (Self::Completed(_), _) => self,
        }
    }

    /// Apply a decision recorded at `decision_stage`.
    ///
    /// A decision whose stage differs from the article's current stage never
    /// moves the article.
    #[must_use]
    pub fn apply(self, decision_stage: ScreeningStage, decision: DecisionType) -> Transition {
        if self.stage() != decision_stage {
            return Transition::StageMismatch {
                article_stage: self.stage(),
                decision_stage,
            };
        }
        let to = self.next(decision);
        if to == self {
            Transition::Unchanged
        } else {
            Transition::Advanced { from: self, to }
        }
    }

    /// Open title/abstract screening. Only valid from `imported`.
    #[must_use]
    pub const fn start_screening(self) -> Option<Self> {
        match self {
            Self::TitleAbstract { started: false } => Some(Self::TitleAbstract { started: true }),
            _ => None,
        }
    }

    /// Record that a full-text document is available.
    ///
    /// Moves `awaiting_full_text` to `full_text_retrieved`; every other phase
    /// is returned unchanged.
    #[must_use]
    pub const fn attach_full_text(self) -> Self {
        match self {
            Self::FullText { retrieved: false } => Self::FullText { retrieved: true },
            other => other,
        }
    }
}

impl From<ArticleStatus> for ScreeningPhase {
    fn from(status: ArticleStatus) -> Self {
        match status {
            ArticleStatus::Imported => Self::TitleAbstract { started: false },
            ArticleStatus::Screening => Self::TitleAbstract { started: true },
            ArticleStatus::AwaitingFullText => Self::FullText { retrieved: false },
            ArticleStatus::FullTextRetrieved => Self::FullText { retrieved: true },
            ArticleStatus::Included => Self::Completed(Verdict::Included),
            ArticleStatus::Excluded => Self::Completed(Verdict::Excluded),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Result of applying a decision to a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced {
        from: ScreeningPhase,
        to: ScreeningPhase,
    },
    Unchanged,
    StageMismatch {
        article_stage: ScreeningStage,
        decision_stage: ScreeningStage,
    },
}

impl Transition {
    /// Phase after the transition, given the phase it was applied to.
    #[must_use]
    pub const fn resulting_phase(self, current: ScreeningPhase) -> ScreeningPhase {
        match self {
            Self::Advanced { to, .. } => to,
            Self::Unchanged | Self::StageMismatch { .. } => current,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialized view
// ---------------------------------------------------------------------------

/// Wire shape of a phase: the three derived fields side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseView {
    pub status: ArticleStatus,
    pub current_stage: ScreeningStage,
    pub final_decision: FinalDecision,
}

impl From<ScreeningPhase> for PhaseView {
    fn from(phase: ScreeningPhase) -> Self {
        Self {
            status: phase.status(),
            current_stage: phase.stage(),
            final_decision: phase.final_decision(),
        }
    }
}

impl TryFrom<PhaseView> for ScreeningPhase {
    type Error = String;

    fn try_from(view: PhaseView) -> Result<Self, Self::Error> {
        let phase = Self::from(view.status);
        if phase.stage() != view.current_stage || phase.final_decision() != view.final_decision {
            return Err(format!(
                "inconsistent phase: status {} implies stage {} and final decision {}, got {} and {}",
                view.status,
                phase.stage(),
                phase.final_decision(),
                view.current_stage,
                view.final_decision
            ));
        }
        Ok(phase)
    }
}

impl JsonSchema for ScreeningPhase {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        PhaseView::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        PhaseView::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ArticleStatus::Imported, DecisionType::Include, ArticleStatus::AwaitingFullText)]
    #[case(ArticleStatus::Imported, DecisionType::Exclude, ArticleStatus::Excluded)]
    #[case(ArticleStatus::Screening, DecisionType::Include, ArticleStatus::AwaitingFullText)]
    #[case(ArticleStatus::Screening, DecisionType::Exclude, ArticleStatus::Excluded)]
    #[case(ArticleStatus::Screening, DecisionType::Uncertain, ArticleStatus::Screening)]
    #[case(ArticleStatus::AwaitingFullText, DecisionType::Include, ArticleStatus::Included)]
    #[case(ArticleStatus::AwaitingFullText, DecisionType::Exclude, ArticleStatus::Excluded)]
    #[case(ArticleStatus::FullTextRetrieved, DecisionType::Include, ArticleStatus::Included)]
    #[case(ArticleStatus::FullTextRetrieved, DecisionType::Exclude, ArticleStatus::Excluded)]
    #[case(
        ArticleStatus::FullTextRetrieved,
        DecisionType::Uncertain,
        ArticleStatus::FullTextRetrieved
    )]
    #[case(ArticleStatus::Included, DecisionType::Exclude, ArticleStatus::Included)]
    #[case(ArticleStatus::Excluded, DecisionType::Include, ArticleStatus::Excluded)]
    fn transition_table(
        #[case] from: ArticleStatus,
        #[case] decision: DecisionType,
        #[case] expected: ArticleStatus,
    ) {
        let phase = ScreeningPhase::from(from);
        assert_eq!(phase.next(decision).status(), expected);
    }

    #[test]
    fn derived_views_are_consistent_for_every_status() {
        for status in ArticleStatus::ALL {
            let phase = ScreeningPhase::from(status);
            assert_eq!(phase.status(), status);
            let completed = phase.stage() == ScreeningStage::Completed;
            assert_eq!(completed, phase.final_decision() != FinalDecision::Pending);
            assert_eq!(completed, status.is_terminal());
        }
    }

    #[test]
    fn every_advance_is_an_allowed_status_edge() {
        for status in ArticleStatus::ALL {
            let phase = ScreeningPhase::from(status);
            for decision in [DecisionType::Include, DecisionType::Exclude] {
                if let Transition::Advanced { from, to } = phase.apply(phase.stage(), decision) {
                    assert!(from.status().can_transition_to(to.status()));
                }
            }
        }
    }

    #[test]
    fn uncertain_never_changes_phase() {
        for status in ArticleStatus::ALL {
            let phase = ScreeningPhase::from(status);
            assert_eq!(
                phase.apply(phase.stage(), DecisionType::Uncertain),
                Transition::Unchanged
            );
        }
    }

    #[test]
    fn stage_mismatch_is_a_no_op() {
        let phase = ScreeningPhase::FullText { retrieved: false };
        let transition = phase.apply(ScreeningStage::TitleAbstract, DecisionType::Exclude);
        assert_eq!(
            transition,
            Transition::StageMismatch {
                article_stage: ScreeningStage::FullText,
                decision_stage: ScreeningStage::TitleAbstract,
            }
        );
        assert_eq!(transition.resulting_phase(phase), phase);
    }

    #[test]
    fn include_path_through_both_stages() {
        let mut phase = ScreeningPhase::INITIAL.start_screening().unwrap();
        phase = phase
            .apply(ScreeningStage::TitleAbstract, DecisionType::Include)
            .resulting_phase(phase);
        assert_eq!(phase.status(), ArticleStatus::AwaitingFullText);
        assert_eq!(phase.stage(), ScreeningStage::FullText);
        assert_eq!(phase.final_decision(), FinalDecision::Pending);

        phase = phase
            .apply(ScreeningStage::FullText, DecisionType::Include)
            .resulting_phase(phase);
        assert_eq!(phase.status(), ArticleStatus::Included);
        assert_eq!(phase.stage(), ScreeningStage::Completed);
        assert_eq!(phase.final_decision(), FinalDecision::Included);
    }

    #[test]
    fn start_screening_only_from_imported() {
        assert!(ScreeningPhase::INITIAL.start_screening().is_some());
        assert!(
            ScreeningPhase::from(ArticleStatus::Screening)
                .start_screening()
                .is_none()
        );
    }

    #[test]
    fn attach_full_text_only_moves_awaiting() {
        let awaiting = ScreeningPhase::FullText { retrieved: false };
        assert_eq!(
            awaiting.attach_full_text().status(),
            ArticleStatus::FullTextRetrieved
        );
        let screening = ScreeningPhase::from(ArticleStatus::Screening);
        assert_eq!(screening.attach_full_text(), screening);
        let done = ScreeningPhase::Completed(Verdict::Excluded);
        assert_eq!(done.attach_full_text(), done);
    }

    #[test]
    fn serializes_as_three_fields() {
        let json = serde_json::to_value(ScreeningPhase::FullText { retrieved: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "full_text_retrieved",
                "current_stage": "full_text",
                "final_decision": "pending",
            })
        );
    }

    #[test]
    fn rejects_inconsistent_view() {
        let json = serde_json::json!({
            "status": "included",
            "current_stage": "full_text",
            "final_decision": "included",
        });
        let err = serde_json::from_value::<ScreeningPhase>(json).unwrap_err();
        assert!(err.to_string().contains("inconsistent phase"));
    }
}
