//! Screening decision repository.
//!
//! Decisions are append-only. Recording one re-reads the owning article,
//! inserts the decision and applies the phase transition inside a single
//! write unit, so the log and the article never disagree.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sift_core::audit_detail::DecisionRecordedDetail;
use sift_core::entities::{Article, ScreeningDecision};
use sift_core::enums::{AiCheckStatus, AuditAction, DecisionSource, EntityType, ScreeningStage};
use sift_core::evaluation::AiCheckResult;
use sift_core::inputs::NewDecision;
use sift_core::phase::Transition;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json, to_json_text};
use crate::repos::article::{fetch_article_in, set_phase_in, stamp_ai_check_in};
use crate::repos::audit::{AuditRecord, append_audit_in};
use crate::service::SiftService;

const SELECT_COLS: &str = "d.id, d.article_id, d.reviewer_id, d.stage, d.decision, d.source, \
    d.confidence_score, d.reasoning, d.primary_exclusion_reason, d.criteria_evaluations, d.created_at";

fn row_to_decision(row: &libsql::Row) -> Result<ScreeningDecision, DatabaseError> {
    Ok(ScreeningDecision {
        id: row.get::<i64>(0)?,
        article_id: row.get::<i64>(1)?,
        reviewer_id: row.get::<Option<i64>>(2)?,
        stage: parse_enum(&row.get::<String>(3)?)?,
        decision: parse_enum(&row.get::<String>(4)?)?,
        source: parse_enum(&row.get::<String>(5)?)?,
        confidence_score: row.get::<Option<f64>>(6)?,
        reasoning: get_opt_string(row, 7)?,
        primary_exclusion_reason: get_opt_string(row, 8)?,
        criteria_evaluations: parse_optional_json(get_opt_string(row, 9)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

async fn collect_decisions(mut rows: libsql::Rows) -> Result<Vec<ScreeningDecision>, DatabaseError> {
    let mut decisions = Vec::new();
    while let Some(row) = rows.next().await? {
        decisions.push(row_to_decision(&row)?);
    }
    Ok(decisions)
}

/// Outcome of recording a decision.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedDecision {
    pub decision: ScreeningDecision,
    /// The article after the transition (or unchanged).
    pub article: Article,
    /// False when the decision's stage differed from the article's stage and
    /// the decision was only logged.
    pub applied: bool,
}

async fn insert_decision_in(
    conn: &libsql::Connection,
    article_id: i64,
    input: &NewDecision,
    at: DateTime<Utc>,
) -> Result<ScreeningDecision, DatabaseError> {
    let evaluations = input
        .criteria_evaluations
        .as_ref()
        .map(to_json_text)
        .transpose()?;
    conn.execute(
        "INSERT INTO screening_decisions (article_id, reviewer_id, stage, decision, source,
                                          confidence_score, reasoning, primary_exclusion_reason,
                                          criteria_evaluations, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        libsql::params![
            article_id,
            input.reviewer_id,
            input.stage.as_str(),
            input.decision.as_str(),
            input.source.as_str(),
            input.confidence_score,
            input.reasoning.as_deref(),
            input.primary_exclusion_reason.as_deref(),
            evaluations,
            at.to_rfc3339()
        ],
    )
    .await?;

    Ok(ScreeningDecision {
        id: conn.last_insert_rowid(),
        article_id,
        reviewer_id: input.reviewer_id,
        stage: input.stage,
        decision: input.decision,
        source: input.source,
        confidence_score: input.confidence_score,
        reasoning: input.reasoning.clone(),
        primary_exclusion_reason: input.primary_exclusion_reason.clone(),
        criteria_evaluations: input.criteria_evaluations.clone(),
        created_at: at,
    })
}

async fn record_decision_in(
    conn: &libsql::Connection,
    project_id: i64,
    article_id: i64,
    input: &NewDecision,
    ai_result: Option<&AiCheckResult>,
) -> Result<RecordedDecision, DatabaseError> {
    let article = fetch_article_in(conn, project_id, article_id).await?;
    let now = Utc::now();
    let decision = insert_decision_in(conn, article_id, input, now).await?;

    let transition = article.phase.apply(input.stage, input.decision);
    match transition {
        Transition::Advanced { to, .. } => {
            set_phase_in(conn, &article, to, "decision recorded", now).await?;
        }
        Transition::Unchanged => {
            tracing::debug!(article_id, decision = %input.decision, "decision leaves article unchanged");
        }
        Transition::StageMismatch {
            article_stage,
            decision_stage,
        } => {
            tracing::warn!(
                article_id,
                %article_stage,
                %decision_stage,
                "decision logged but not applied: stage mismatch"
            );
        }
    }
    let applied = !matches!(transition, Transition::StageMismatch { .. });

    append_audit_in(
        conn,
        &AuditRecord::new(
            project_id,
            EntityType::Decision,
            decision.id,
            AuditAction::DecisionRecorded,
        )
        .with_detail(&DecisionRecordedDetail {
            decision_id: decision.id,
            stage: decision.stage,
            decision: decision.decision,
            source: decision.source,
            applied,
        })?,
        now,
    )
    .await?;

    if let Some(result) = ai_result {
        stamp_ai_check_in(conn, project_id, article_id, AiCheckStatus::Completed, result, now)
            .await?;
    }

    let article = fetch_article_in(conn, project_id, article_id).await?;
    Ok(RecordedDecision {
        decision,
        article,
        applied,
    })
}

impl SiftService {
    /// Append a decision and apply its transition to the article, atomically.
    ///
    /// A decision whose stage differs from the article's current stage is
    /// logged with `applied = false` and does not move the article.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Validation` when the input is malformed.
    /// - `DatabaseError::NotFound` when the article is absent from the project.
    /// - `DatabaseError::ConcurrencyConflict` when the write lock cannot be taken.
    pub async fn record_decision(
        &self,
        project_id: i64,
        article_id: i64,
        input: &NewDecision,
    ) -> Result<RecordedDecision, DatabaseError> {
        input.validate()?;
        let unit = self.begin_unit().await?;
        let result = record_decision_in(&unit, project_id, article_id, input, None).await;
        let recorded = unit.finish(result).await?;
        tracing::info!(
            article_id,
            decision_id = recorded.decision.id,
            decision = %recorded.decision.decision,
            status = %recorded.article.phase.status(),
            "decision recorded"
        );
        Ok(recorded)
    }

    /// Record an AI decision together with the article's AI check stamp.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record_decision`], plus `DatabaseError::Validation`
    /// when `input` is not an `ai_agent` decision.
    pub async fn record_ai_decision(
        &self,
        project_id: i64,
        article_id: i64,
        input: &NewDecision,
        check: &AiCheckResult,
    ) -> Result<RecordedDecision, DatabaseError> {
        if input.source != DecisionSource::AiAgent {
            return Err(DatabaseError::Validation(
                "AI check results require an ai_agent decision".into(),
            ));
        }
        input.validate()?;
        let unit = self.begin_unit().await?;
        let result = record_decision_in(&unit, project_id, article_id, input, Some(check)).await;
        unit.finish(result).await
    }

    /// All decisions for an article, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn list_decisions(
        &self,
        project_id: i64,
        article_id: i64,
    ) -> Result<Vec<ScreeningDecision>, DatabaseError> {
        fetch_article_in(self.db().reader(), project_id, article_id).await?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM screening_decisions d WHERE d.article_id = ?1 ORDER BY d.id DESC"
        );
        let rows = self.db().query_with(&sql, || [article_id]).await?;
        collect_decisions(rows).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` unless the decision belongs to an
    /// article of the project.
    pub async fn get_decision(
        &self,
        project_id: i64,
        id: i64,
    ) -> Result<ScreeningDecision, DatabaseError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM screening_decisions d
             JOIN articles a ON a.id = d.article_id
             WHERE d.id = ?1 AND a.project_id = ?2"
        );
        let mut rows = self.db().query_with(&sql, || [id, project_id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NotFound {
            entity: "decision",
            id,
        })?;
        row_to_decision(&row)
    }

    /// Most recent decision recorded at `stage`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn latest_decision_at(
        &self,
        project_id: i64,
        article_id: i64,
        stage: ScreeningStage,
    ) -> Result<Option<ScreeningDecision>, DatabaseError> {
        fetch_article_in(self.db().reader(), project_id, article_id).await?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM screening_decisions d
             WHERE d.article_id = ?1 AND d.stage = ?2
             ORDER BY d.id DESC LIMIT 1"
        );
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params![article_id, stage.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_decision(&row)?)),
            None => Ok(None),
        }
    }

    /// Most recent `ai_agent` decision for an article.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` when the article is absent or has
    /// no AI decision.
    pub async fn latest_ai_decision(
        &self,
        project_id: i64,
        article_id: i64,
    ) -> Result<ScreeningDecision, DatabaseError> {
        fetch_article_in(self.db().reader(), project_id, article_id).await?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM screening_decisions d
             WHERE d.article_id = ?1 AND d.source = 'ai_agent'
             ORDER BY d.id DESC LIMIT 1"
        );
        let mut rows = self.db().query_with(&sql, || [article_id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NotFound {
            entity: "AI decision for article",
            id: article_id,
        })?;
        row_to_decision(&row)
    }
}
