//! Screening and article statistics, recomputed on every read.

use std::collections::BTreeMap;

use sift_core::enums::{ArticleStatus, ScreeningStage};
use sift_core::stats::{ArticleStats, ScreeningStats};

use crate::error::DatabaseError;
use crate::helpers::parse_enum;
use crate::service::SiftService;

fn to_count(value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|e| DatabaseError::Query(format!("negative count: {e}")))
}

impl SiftService {
    async fn count_grouped<K: Ord + serde::de::DeserializeOwned>(
        &self,
        column: &str,
        project_id: i64,
    ) -> Result<BTreeMap<K, u64>, DatabaseError> {
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM articles WHERE project_id = ?1 GROUP BY {column}"
        );
        let mut rows = self.db().query_with(&sql, || [project_id]).await?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            let key: K = parse_enum(&row.get::<String>(0)?)?;
            counts.insert(key, to_count(row.get::<i64>(1)?)?);
        }
        Ok(counts)
    }

    async fn count_single(&self, sql: &str, project_id: i64) -> Result<u64, DatabaseError> {
        let mut rows = self.db().query_with(sql, || [project_id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        to_count(row.get::<i64>(0)?)
    }

    async fn distinct_screened_at(
        &self,
        project_id: i64,
        stage: ScreeningStage,
    ) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(DISTINCT d.article_id) FROM screening_decisions d
                 JOIN articles a ON a.id = d.article_id
                 WHERE a.project_id = ?1 AND d.stage = ?2",
                || libsql::params![project_id, stage.as_str()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        to_count(row.get::<i64>(0)?)
    }

    /// Project-wide screening counters.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn screening_stats(&self, project_id: i64) -> Result<ScreeningStats, DatabaseError> {
        let by_status: BTreeMap<ArticleStatus, u64> =
            self.count_grouped("phase", project_id).await?;
        let uncertain = self
            .count_single(
                "SELECT COUNT(*) FROM articles a
                 WHERE a.project_id = ?1 AND a.current_stage != 'completed'
                   AND (SELECT d.decision FROM screening_decisions d
                        WHERE d.article_id = a.id AND d.stage = a.current_stage
                        ORDER BY d.id DESC LIMIT 1) = 'uncertain'",
                project_id,
            )
            .await?;

        let mut stats = ScreeningStats {
            total_articles: by_status.values().sum(),
            screened_title_abstract: self
                .distinct_screened_at(project_id, ScreeningStage::TitleAbstract)
                .await?,
            screened_full_text: self
                .distinct_screened_at(project_id, ScreeningStage::FullText)
                .await?,
            uncertain,
            by_status,
            ..ScreeningStats::default()
        };
        stats.included = stats.status_count(ArticleStatus::Included);
        stats.excluded = stats.status_count(ArticleStatus::Excluded);
        stats.awaiting_screening = stats.status_count(ArticleStatus::Screening);
        stats.awaiting_full_text = stats.status_count(ArticleStatus::AwaitingFullText);
        Ok(stats)
    }

    /// Article counts grouped by status and by current stage.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn article_stats(&self, project_id: i64) -> Result<ArticleStats, DatabaseError> {
        let by_status: BTreeMap<ArticleStatus, u64> =
            self.count_grouped("phase", project_id).await?;
        let by_stage: BTreeMap<ScreeningStage, u64> =
            self.count_grouped("current_stage", project_id).await?;
        Ok(ArticleStats {
            total: by_status.values().sum(),
            by_status,
            by_stage,
        })
    }
}
