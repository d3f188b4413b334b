//! End-to-end screening workflow tests against an in-memory database.
//!
//! Covers the article lifecycle, next-article selection, stats, decision
//! logging semantics and the phase consistency invariant.

use pretty_assertions::assert_eq;
use rstest::rstest;

use sift_core::entities::{Article, Project};
use sift_core::enums::{
    ArticleStatus, AuditAction, DecisionType, FinalDecision, ScreeningStage, UncertainPolicy,
};
use sift_core::inputs::{NewArticle, NewDecision, NewProject};
use sift_db::repos::article::ArticleFilter;
use sift_db::repos::audit::AuditFilter;
use sift_db::service::SiftService;

async fn test_service() -> SiftService {
    SiftService::new_local(":memory:", UncertainPolicy::Strict, 4)
        .await
        .unwrap()
}

async fn project_with_articles(svc: &SiftService, n: usize) -> (Project, Vec<i64>) {
    let project = svc
        .create_project(&NewProject {
            name: "Exercise and depression".into(),
            review_question: Some("Does exercise reduce depressive symptoms?".into()),
            ..NewProject::default()
        })
        .await
        .unwrap();
    let mut ids = Vec::new();
    for i in 0..n {
        let article = svc
            .create_article(
                project.id,
                &NewArticle {
                    title: format!("Trial {i}"),
                    ..NewArticle::default()
                },
            )
            .await
            .unwrap();
        ids.push(article.id);
    }
    (project, ids)
}

fn triple(article: &Article) -> (ArticleStatus, ScreeningStage, FinalDecision) {
    (
        article.phase.status(),
        article.phase.stage(),
        article.phase.final_decision(),
    )
}

fn assert_consistent(article: &Article) {
    let (status, stage, final_decision) = triple(article);
    let terminal = matches!(status, ArticleStatus::Included | ArticleStatus::Excluded);
    assert_eq!(final_decision != FinalDecision::Pending, terminal);
    assert_eq!(stage == ScreeningStage::Completed, terminal);
}

fn human(stage: ScreeningStage, decision: DecisionType) -> NewDecision {
    NewDecision::human(stage, decision, 1)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn article_walks_through_both_stages_to_exclusion() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 1).await;
    let id = ids[0];

    let article = svc.get_article(project.id, id).await.unwrap();
    assert_eq!(
        triple(&article),
        (ArticleStatus::Imported, ScreeningStage::TitleAbstract, FinalDecision::Pending)
    );

    assert_eq!(svc.start_screening(project.id).await.unwrap(), 1);
    let article = svc.get_article(project.id, id).await.unwrap();
    assert_eq!(
        triple(&article),
        (ArticleStatus::Screening, ScreeningStage::TitleAbstract, FinalDecision::Pending)
    );

    let recorded = svc
        .record_decision(
            project.id,
            id,
            &human(ScreeningStage::TitleAbstract, DecisionType::Include),
        )
        .await
        .unwrap();
    assert_eq!(
        triple(&recorded.article),
        (ArticleStatus::AwaitingFullText, ScreeningStage::FullText, FinalDecision::Pending)
    );

    let article = svc
        .attach_full_text(project.id, id, "/papers/trial-0.pdf", Some("Methods..."))
        .await
        .unwrap();
    assert_eq!(
        triple(&article),
        (ArticleStatus::FullTextRetrieved, ScreeningStage::FullText, FinalDecision::Pending)
    );

    let recorded = svc
        .record_decision(
            project.id,
            id,
            &human(ScreeningStage::FullText, DecisionType::Exclude).with_exclusion_reason("E2"),
        )
        .await
        .unwrap();
    assert_eq!(
        triple(&recorded.article),
        (ArticleStatus::Excluded, ScreeningStage::Completed, FinalDecision::Excluded)
    );

    let history = svc
        .query_audit(&AuditFilter {
            project_id: Some(project.id),
            action: Some(AuditAction::StatusChanged),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(history.len(), 4);
}

#[rstest]
#[case(ScreeningStage::TitleAbstract, DecisionType::Include,
       (ArticleStatus::AwaitingFullText, ScreeningStage::FullText, FinalDecision::Pending))]
#[case(ScreeningStage::TitleAbstract, DecisionType::Exclude,
       (ArticleStatus::Excluded, ScreeningStage::Completed, FinalDecision::Excluded))]
#[case(ScreeningStage::FullText, DecisionType::Include,
       (ArticleStatus::Included, ScreeningStage::Completed, FinalDecision::Included))]
#[case(ScreeningStage::FullText, DecisionType::Exclude,
       (ArticleStatus::Excluded, ScreeningStage::Completed, FinalDecision::Excluded))]
#[tokio::test]
async fn decisive_decisions_yield_exact_triples(
    #[case] stage: ScreeningStage,
    #[case] decision: DecisionType,
    #[case] expected: (ArticleStatus, ScreeningStage, FinalDecision),
) {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 1).await;
    svc.start_screening(project.id).await.unwrap();
    if stage == ScreeningStage::FullText {
        svc.record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Include),
        )
        .await
        .unwrap();
    }

    let recorded = svc
        .record_decision(project.id, ids[0], &human(stage, decision))
        .await
        .unwrap();
    assert_eq!(triple(&recorded.article), expected);
    assert_consistent(&recorded.article);
}

#[tokio::test]
async fn repeated_uncertain_only_grows_the_log() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 1).await;
    svc.start_screening(project.id).await.unwrap();
    let before = svc.get_article(project.id, ids[0]).await.unwrap();

    for _ in 0..2 {
        let recorded = svc
            .record_decision(
                project.id,
                ids[0],
                &human(ScreeningStage::TitleAbstract, DecisionType::Uncertain),
            )
            .await
            .unwrap();
        assert_eq!(triple(&recorded.article), triple(&before));
    }
    assert_eq!(svc.list_decisions(project.id, ids[0]).await.unwrap().len(), 2);

    let recorded = svc
        .record_decision(
            project.id,
            ids[0],
            &human(ScreeningStage::TitleAbstract, DecisionType::Include),
        )
        .await
        .unwrap();
    assert_eq!(recorded.article.phase.status(), ArticleStatus::AwaitingFullText);
}

#[tokio::test]
async fn invariant_holds_across_mixed_decisions() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 4).await;
    svc.start_screening(project.id).await.unwrap();

    let script = [
        (0, ScreeningStage::TitleAbstract, DecisionType::Uncertain),
        (0, ScreeningStage::TitleAbstract, DecisionType::Include),
        (1, ScreeningStage::FullText, DecisionType::Include),
        (1, ScreeningStage::TitleAbstract, DecisionType::Exclude),
        (2, ScreeningStage::TitleAbstract, DecisionType::Include),
        (2, ScreeningStage::FullText, DecisionType::Include),
        (2, ScreeningStage::FullText, DecisionType::Exclude),
        (3, ScreeningStage::TitleAbstract, DecisionType::Exclude),
        (3, ScreeningStage::TitleAbstract, DecisionType::Include),
    ];
    for (idx, stage, decision) in script {
        let recorded = svc
            .record_decision(project.id, ids[idx], &human(stage, decision))
            .await
            .unwrap();
        assert_consistent(&recorded.article);
    }

    let articles = svc
        .list_articles(project.id, &ArticleFilter::default())
        .await
        .unwrap();
    let statuses: Vec<_> = articles.iter().map(|a| a.phase.status()).collect();
    assert_eq!(
        statuses,
        vec![
            ArticleStatus::AwaitingFullText,
            ArticleStatus::Excluded,
            ArticleStatus::Included,
            ArticleStatus::Excluded,
        ]
    );
}

// ---------------------------------------------------------------------------
// Next-article selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn next_article_never_repeats_a_decided_article() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 3).await;
    svc.start_screening(project.id).await.unwrap();

    let mut served = Vec::new();
    while let Some(article) = svc
        .next_article(project.id, ScreeningStage::TitleAbstract)
        .await
        .unwrap()
    {
        assert_eq!(article.phase.status(), ArticleStatus::Screening);
        assert!(!served.contains(&article.id));
        served.push(article.id);
        svc.record_decision(
            project.id,
            article.id,
            &human(ScreeningStage::TitleAbstract, DecisionType::Uncertain),
        )
        .await
        .unwrap();
    }
    assert_eq!(served, ids);
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_for_five_articles_two_screened() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 5).await;
    svc.start_screening(project.id).await.unwrap();

    svc.record_decision(
        project.id,
        ids[0],
        &human(ScreeningStage::TitleAbstract, DecisionType::Include),
    )
    .await
    .unwrap();
    svc.record_decision(
        project.id,
        ids[1],
        &human(ScreeningStage::TitleAbstract, DecisionType::Exclude),
    )
    .await
    .unwrap();

    let stats = svc.screening_stats(project.id).await.unwrap();
    assert_eq!(stats.total_articles, 5);
    assert_eq!(stats.screened_title_abstract, 2);
    assert_eq!(stats.screened_full_text, 0);
    assert_eq!(stats.excluded, 1);
    assert_eq!(stats.included, 0);
    assert_eq!(stats.awaiting_full_text, 1);
    assert_eq!(stats.awaiting_screening, 3);
    assert_eq!(stats.by_status.values().sum::<u64>(), stats.total_articles);
}

#[tokio::test]
async fn screened_counts_persist_after_articles_advance() {
    let svc = test_service().await;
    let (project, ids) = project_with_articles(&svc, 1).await;
    svc.start_screening(project.id).await.unwrap();
    svc.record_decision(
        project.id,
        ids[0],
        &human(ScreeningStage::TitleAbstract, DecisionType::Include),
    )
    .await
    .unwrap();
    svc.attach_full_text(project.id, ids[0], "/p.pdf", None)
        .await
        .unwrap();
    svc.record_decision(
        project.id,
        ids[0],
        &human(ScreeningStage::FullText, DecisionType::Include),
    )
    .await
    .unwrap();

    let stats = svc.screening_stats(project.id).await.unwrap();
    assert_eq!(stats.screened_title_abstract, 1);
    assert_eq!(stats.screened_full_text, 1);
    assert_eq!(stats.included, 1);
    assert_eq!(stats.status_count(ArticleStatus::Screening), 0);
}
