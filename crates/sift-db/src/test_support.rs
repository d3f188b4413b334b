//! Shared test utilities for sift-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::atomic::{AtomicU32, Ordering};

    use sift_core::entities::Project;
    use sift_core::enums::UncertainPolicy;
    use sift_core::inputs::{NewArticle, NewProject};

    use crate::SiftDb;
    use crate::service::SiftService;

    static PROJECT_SEQ: AtomicU32 = AtomicU32::new(0);

    /// In-memory service with the default (strict) uncertain policy.
    pub async fn test_service() -> SiftService {
        test_service_with_policy(UncertainPolicy::Strict).await
    }

    pub async fn test_service_with_policy(policy: UncertainPolicy) -> SiftService {
        let db = SiftDb::open_local(":memory:").await.unwrap();
        SiftService::from_db(db, policy)
    }

    /// Service over a database file in `dir`, with separate read and write
    /// connections.
    pub async fn file_service(dir: &tempfile::TempDir) -> SiftService {
        let path = dir.path().join("sift.db");
        let db = SiftDb::open_local(&path.to_string_lossy()).await.unwrap();
        SiftService::from_db(db, UncertainPolicy::Strict)
    }

    pub async fn seed_project(svc: &SiftService) -> Project {
        let n = PROJECT_SEQ.fetch_add(1, Ordering::Relaxed);
        svc.create_project(&NewProject {
            name: format!("Review {n}"),
            review_question: Some("Does the intervention improve outcomes?".into()),
            ..NewProject::default()
        })
        .await
        .unwrap()
    }

    pub fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            abstract_text: Some(format!("Abstract of {title}")),
            ..NewArticle::default()
        }
    }

    /// Create `n` imported articles and return their ids in creation order.
    pub async fn seed_articles(svc: &SiftService, project_id: i64, n: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let article = svc
                .create_article(project_id, &new_article(&format!("Article {i}")))
                .await
                .unwrap();
            ids.push(article.id);
        }
        ids
    }

    /// A project with `n` articles already in title/abstract screening.
    pub async fn screening_project(svc: &SiftService, n: usize) -> (Project, Vec<i64>) {
        let project = seed_project(svc).await;
        let ids = seed_articles(svc, project.id, n).await;
        svc.start_screening(project.id).await.unwrap();
        (project, ids)
    }
}
