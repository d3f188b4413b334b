//! Single-article and batch AI screening.
//!
//! [`AiScreener`] takes a criterion snapshot, asks the evaluator for a
//! judgement and records the outcome through [`SiftService`]. A successful
//! evaluation becomes an `ai_agent` decision at the article's current stage
//! and drives the phase machine like any other decision. A failed one is
//! stamped on the article (`ai_check_status = error`) and no decision is
//! written.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use sift_core::entities::Article;
use sift_core::enums::ScreeningStage;
use sift_core::events::{EventScope, ScreeningEvent};
use sift_db::repos::decision::RecordedDecision;
use sift_db::service::SiftService;
use sift_import::fulltext;

use crate::error::AgentError;
use crate::evaluator::{CriterionSpec, EvaluationRequest, ScreeningEvaluator, ScreeningResult};
use crate::notify::EventSink;
use crate::prompt;

/// Default bound on a single evaluator call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Review question and active criteria, read once per screening run.
#[derive(Debug, Clone)]
struct Snapshot {
    review_question: String,
    criteria: Vec<CriterionSpec>,
}

/// Selection and delivery options for [`AiScreener::run_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Only screen articles currently at this stage.
    pub stage: Option<ScreeningStage>,
    /// Maximum number of articles to evaluate.
    pub limit: Option<u32>,
    /// Audience for per-article events. Defaults to the project room.
    pub scope: Option<EventScope>,
}

/// Per-article outcomes of a batch run, in processing order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BatchReport {
    pub screened: usize,
    pub failed: usize,
    pub events: Vec<ScreeningEvent>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.screened + self.failed
    }
}

/// Runs evaluations against one service, evaluator and event sink.
pub struct AiScreener<'a> {
    service: &'a SiftService,
    evaluator: &'a dyn ScreeningEvaluator,
    sink: &'a dyn EventSink,
    timeout: Duration,
}

impl<'a> AiScreener<'a> {
    #[must_use]
    pub fn new(
        service: &'a SiftService,
        evaluator: &'a dyn ScreeningEvaluator,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            service,
            evaluator,
            sink,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the per-call evaluator timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn snapshot(&self, project_id: i64) -> Result<Snapshot, AgentError> {
        let project = self.service.get_project(project_id).await?;
        let criteria = self.service.list_criteria(project_id, true).await?;
        if criteria.is_empty() {
            return Err(AgentError::PreconditionFailed(format!(
                "project {project_id} has no active criteria"
            )));
        }
        Ok(Snapshot {
            review_question: project
                .review_question
                .filter(|q| !q.trim().is_empty())
                .unwrap_or(project.name),
            criteria: criteria.iter().map(CriterionSpec::from).collect(),
        })
    }

    /// Screen one article and record the result.
    ///
    /// # Errors
    ///
    /// - `AgentError::PreconditionFailed` when the project has no active
    ///   criteria or the article has already completed screening.
    /// - Any evaluator failure, after it has been stamped on the article.
    /// - `AgentError::Database` for storage errors.
    pub async fn screen_article(
        &self,
        project_id: i64,
        article_id: i64,
    ) -> Result<RecordedDecision, AgentError> {
        let snapshot = self.snapshot(project_id).await?;
        let article = self.service.get_article(project_id, article_id).await?;
        self.screen_with(&snapshot, &article).await
    }

    async fn screen_with(
        &self,
        snapshot: &Snapshot,
        article: &Article,
    ) -> Result<RecordedDecision, AgentError> {
        let stage = article.phase.stage();
        if stage == ScreeningStage::Completed {
            return Err(AgentError::PreconditionFailed(format!(
                "article {} has already completed screening",
                article.id
            )));
        }

        let full_text = self.full_text(article).await?;
        let request = EvaluationRequest {
            article_text: prompt::article_text(article, full_text.as_deref()),
            review_question: snapshot.review_question.clone(),
            criteria: snapshot.criteria.clone(),
        };

        match self.evaluate(&request).await {
            Ok(result) => {
                let recorded = self
                    .service
                    .record_ai_decision(
                        article.project_id,
                        article.id,
                        &result.to_decision(stage),
                        &result.to_check_result(),
                    )
                    .await?;
                tracing::info!(
                    article_id = article.id,
                    %stage,
                    decision = %result.decision,
                    confidence = result.confidence,
                    applied = recorded.applied,
                    "AI screening recorded"
                );
                Ok(recorded)
            }
            Err(error) => {
                self.service
                    .mark_ai_check_error(article.project_id, article.id, &error.to_string())
                    .await?;
                tracing::warn!(article_id = article.id, %error, "AI screening failed");
                Err(error)
            }
        }
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ScreeningResult, AgentError> {
        let result = tokio::time::timeout(self.timeout, self.evaluator.evaluate(request))
            .await
            .map_err(|_| AgentError::Timeout {
                secs: self.timeout.as_secs(),
            })??;
        result.validate(&request.criteria)?;
        Ok(result)
    }

    /// Stored full-text content, falling back to reading the attached file.
    async fn full_text(&self, article: &Article) -> Result<Option<String>, AgentError> {
        if let Some(content) = self
            .service
            .article_full_text(article.project_id, article.id)
            .await?
        {
            return Ok(Some(content));
        }
        let Some(path) = article.full_text_path.clone() else {
            return Ok(None);
        };
        let document = PathBuf::from(path);
        let text = tokio::task::spawn_blocking(move || fulltext::read_text_lenient(&document))
            .await
            .map_err(|e| AgentError::Evaluator(format!("full text reader stopped: {e}")))?;
        Ok(text)
    }

    /// Screen every eligible article of a project, one at a time.
    ///
    /// Eligible articles are open ones with no AI decision at their current
    /// stage. A failing article is reported and skipped; the run continues.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::PreconditionFailed` when the project has no
    /// active criteria, or `AgentError::Database` if the candidate set cannot
    /// be read.
    pub async fn run_batch(
        &self,
        project_id: i64,
        options: &BatchOptions,
    ) -> Result<BatchReport, AgentError> {
        let snapshot = self.snapshot(project_id).await?;
        let candidates = self
            .service
            .ai_batch_candidates(project_id, options.stage, options.limit)
            .await?;
        let scope = options
            .scope
            .clone()
            .unwrap_or_else(|| EventScope::project(project_id));
        tracing::info!(project_id, candidates = candidates.len(), "AI batch started");

        let mut report = BatchReport::default();
        for article in &candidates {
            let event = match self.screen_with(&snapshot, article).await {
                Ok(recorded) => ScreeningEvent::AiScreeningComplete {
                    article_id: article.id,
                    decision: recorded.decision.decision,
                    confidence: recorded.decision.confidence_score.unwrap_or_default(),
                },
                Err(error) => {
                    tracing::warn!(article_id = article.id, %error, "skipping article in AI batch");
                    ScreeningEvent::AiScreeningError {
                        article_id: article.id,
                        error: error.to_string(),
                    }
                }
            };
            if event.is_error() {
                report.failed += 1;
            } else {
                report.screened += 1;
            }
            tracing::debug!(article_id = article.id, kind = event.kind(), "publishing event");
            self.sink.publish(&scope, &event);
            report.events.push(event);
        }

        tracing::info!(
            project_id,
            screened = report.screened,
            failed = report.failed,
            "AI batch finished"
        );
        Ok(report)
    }
}
