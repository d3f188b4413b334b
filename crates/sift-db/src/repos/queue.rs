//! Next-article selection and AI batch eligibility.

use sift_core::entities::Article;
use sift_core::enums::{ArticleStatus, ScreeningStage, UncertainPolicy};

use crate::error::DatabaseError;
use crate::repos::article::{SELECT_COLS, row_to_article};
use crate::service::SiftService;

/// Status an article must be in to be served at `stage`.
const fn queue_status(stage: ScreeningStage) -> Option<ArticleStatus> {
    match stage {
        ScreeningStage::TitleAbstract => Some(ArticleStatus::Screening),
        ScreeningStage::FullText => Some(ArticleStatus::FullTextRetrieved),
        ScreeningStage::Completed => None,
    }
}

fn next_article_sql(policy: UncertainPolicy) -> String {
    match policy {
        UncertainPolicy::Strict => format!(
            "SELECT {SELECT_COLS} FROM articles a
             WHERE a.project_id = ?1 AND a.phase = ?2
               AND a.id NOT IN (SELECT DISTINCT d.article_id FROM screening_decisions d
                                WHERE d.stage = ?3)
             ORDER BY a.id LIMIT 1"
        ),
        UncertainPolicy::RequeueLast => format!(
            "SELECT {SELECT_COLS} FROM articles a
             WHERE a.project_id = ?1 AND a.phase = ?2
               AND a.id NOT IN (SELECT DISTINCT d.article_id FROM screening_decisions d
                                WHERE d.stage = ?3 AND d.decision != 'uncertain')
             ORDER BY EXISTS (SELECT 1 FROM screening_decisions d
                              WHERE d.article_id = a.id AND d.stage = ?3),
                      a.id
             LIMIT 1"
        ),
    }
}

impl SiftService {
    /// The next article to screen at `stage`, or `None` when the queue is empty.
    ///
    /// Title/abstract serves `screening` articles, full text serves
    /// `full_text_retrieved` ones, lowest id first. Under the strict policy
    /// any decision at the stage removes the article from the queue for good;
    /// under `requeue_last` articles whose only decisions are `uncertain`
    /// come back after every undecided one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for the `completed` stage.
    pub async fn next_article(
        &self,
        project_id: i64,
        stage: ScreeningStage,
    ) -> Result<Option<Article>, DatabaseError> {
        let status = queue_status(stage).ok_or_else(|| {
            DatabaseError::Validation(format!("no screening queue for stage {stage}"))
        })?;
        let sql = next_article_sql(self.uncertain_policy());
        let mut rows = self
            .db()
            .query_with(&sql, || {
                libsql::params![project_id, status.as_str(), stage.as_str()]
            })
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    /// Open articles with no AI decision at their current stage, in id order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when `stage` is `completed`.
    pub async fn ai_batch_candidates(
        &self,
        project_id: i64,
        stage: Option<ScreeningStage>,
        limit: Option<u32>,
    ) -> Result<Vec<Article>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Integer(project_id)];
        let stage_clause = match stage {
            Some(ScreeningStage::Completed) => {
                return Err(DatabaseError::Validation(
                    "completed articles cannot be screened".into(),
                ));
            }
            Some(stage) => {
                params.push(libsql::Value::Text(stage.as_str().to_string()));
                "AND a.current_stage = ?2"
            }
            None => "",
        };
        let limit = limit.map_or(-1, i64::from);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM articles a
             WHERE a.project_id = ?1 AND a.current_stage != 'completed' {stage_clause}
               AND NOT EXISTS (SELECT 1 FROM screening_decisions d
                               WHERE d.article_id = a.id AND d.stage = a.current_stage
                                 AND d.source = 'ai_agent')
             ORDER BY a.id LIMIT {limit}"
        );
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next().await? {
            articles.push(row_to_article(&row)?);
        }
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sift_core::enums::DecisionType;
    use sift_core::inputs::NewDecision;

    use super::*;
    use crate::test_support::helpers::{screening_project, test_service, test_service_with_policy};

    fn human(stage: ScreeningStage, decision: DecisionType) -> NewDecision {
        NewDecision::human(stage, decision, 1)
    }

    #[tokio::test]
    async fn serves_lowest_undecided_id() {
        let svc = test_service().await;
        let (project, ids) = screening_project(&svc, 3).await;

        let next = svc
            .next_article(project.id, ScreeningStage::TitleAbstract)
            .await
            .unwrap();
        assert_eq!(next.map(|a| a.id), Some(ids[0]));

        svc.record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Exclude),
        )
        .await
        .unwrap();
        let next = svc
            .next_article(project.id, ScreeningStage::TitleAbstract)
            .await
            .unwrap();
        assert_eq!(next.map(|a| a.id), Some(ids[1]));
    }

    #[tokio::test]
    async fn imported_articles_are_not_served() {
        let svc = test_service().await;
        let project = crate::test_support::helpers::seed_project(&svc).await;
        crate::test_support::helpers::seed_articles(&svc, project.id, 2).await;

        assert_eq!(
            svc.next_article(project.id, ScreeningStage::TitleAbstract)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn strict_policy_drops_uncertain_articles() {
        let svc = test_service().await;
        let (project, ids) = screening_project(&svc, 1).await;
        svc.record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Uncertain),
        )
        .await
        .unwrap();

        assert_eq!(
            svc.next_article(project.id, ScreeningStage::TitleAbstract)
                .await
                .unwrap(),
            None
        );
        let uncertain = svc.list_uncertain_articles(project.id).await.unwrap();
        assert_eq!(uncertain.iter().map(|a| a.id).collect::<Vec<_>>(), ids);
    }

    #[tokio::test]
    async fn requeue_last_serves_uncertain_after_undecided() {
        let svc = test_service_with_policy(UncertainPolicy::RequeueLast).await;
        let (project, ids) = screening_project(&svc, 2).await;
        svc.record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Uncertain),
        )
        .await
        .unwrap();

        let next = svc
            .next_article(project.id, ScreeningStage::TitleAbstract)
            .await
            .unwrap();
        assert_eq!(next.map(|a| a.id), Some(ids[1]));

        svc.record_decision(
            project.id,
            ids[1],
            &human(ScreeningStage::TitleAbstract, DecisionType::Exclude),
        )
        .await
        .unwrap();
        let next = svc
            .next_article(project.id, ScreeningStage::TitleAbstract)
            .await
            .unwrap();
        assert_eq!(next.map(|a| a.id), Some(ids[0]));
    }

    #[tokio::test]
    async fn full_text_queue_needs_retrieved_text() {
        let svc = test_service().await;
        let (project, ids) = screening_project(&svc, 1).await;
        svc.record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Include),
        )
        .await
        .unwrap();

        assert_eq!(
            svc.next_article(project.id, ScreeningStage::FullText)
                .await
                .unwrap(),
            None
        );
        svc.attach_full_text(project.id, ids[0], "/papers/a.pdf", None)
            .await
            .unwrap();
        let next = svc
            .next_article(project.id, ScreeningStage::FullText)
            .await
            .unwrap();
        assert_eq!(next.map(|a| a.id), Some(ids[0]));
    }

    #[tokio::test]
    async fn completed_stage_has_no_queue() {
        let svc = test_service().await;
        let (project, _) = screening_project(&svc, 1).await;
        assert!(matches!(
            svc.next_article(project.id, ScreeningStage::Completed).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn ai_candidates_skip_ai_screened_and_completed() {
        let svc = test_service().await;
        let (project, ids) = screening_project(&svc, 4).await;

        // AI uncertain at title/abstract: no longer a candidate.
        svc.record_decision(
            project.id,
            ids[0],
            &NewDecision::ai(ScreeningStage::TitleAbstract, DecisionType::Uncertain),
        )
        .await
        .unwrap();
        // Human exclude: completed.
        svc.record_decision(
            project.id,
            ids[1],
            &human(ScreeningStage::TitleAbstract, DecisionType::Exclude),
        )
        .await
        .unwrap();
        // AI include moves it to full text, where it has no AI decision yet.
        svc.record_decision(
            project.id,
            ids[2],
            &NewDecision::ai(ScreeningStage::TitleAbstract, DecisionType::Include),
        )
        .await
        .unwrap();

        let all = svc
            .ai_batch_candidates(project.id, None, None)
            .await
            .unwrap();
        assert_eq!(
            all.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![ids[2], ids[3]]
        );

        let ta_only = svc
            .ai_batch_candidates(project.id, Some(ScreeningStage::TitleAbstract), Some(5))
            .await
            .unwrap();
        assert_eq!(ta_only.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[3]]);

        let limited = svc
            .ai_batch_candidates(project.id, None, Some(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }
}
