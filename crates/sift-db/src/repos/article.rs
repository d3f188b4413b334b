//! Article repository: import, listing, screening start, full text, AI check stamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sift_core::audit_detail::{ImportedDetail, StatusChangedDetail};
use sift_core::entities::Article;
use sift_core::enums::{AiCheckStatus, ArticleStatus, AuditAction, EntityType, ScreeningStage};
use sift_core::evaluation::AiCheckResult;
use sift_core::inputs::{DedupKey, NewArticle};
use sift_core::phase::ScreeningPhase;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, non_empty, parse_datetime, parse_enum, parse_optional_datetime,
    parse_optional_json, parse_string_list, to_json_text,
};
use crate::repos::audit::{AuditRecord, append_audit_in};
use crate::repos::project::ensure_project_in;
use crate::service::SiftService;

pub(crate) const SELECT_COLS: &str = "a.id, a.project_id, a.title, a.authors, a.abstract, \
    a.publication_date, a.year, a.journal, a.volume, a.issue, a.pages, a.publication_type, \
    a.doi, a.pmid, a.pmcid, a.issn, a.keywords, a.mesh_terms, a.article_url, a.urls, \
    a.source_filename, a.full_text_path, \
    (a.full_text_content IS NOT NULL OR a.full_text_path IS NOT NULL), \
    a.phase, a.ai_check_status, a.ai_check_result, a.last_ai_check, a.created_at, a.updated_at";

pub(crate) fn row_to_article(row: &libsql::Row) -> Result<Article, DatabaseError> {
    let year = row
        .get::<Option<i64>>(6)?
        .map(i32::try_from)
        .transpose()
        .map_err(|e| DatabaseError::Query(format!("year out of range: {e}")))?;
    let status: ArticleStatus = parse_enum(&row.get::<String>(23)?)?;

    Ok(Article {
        id: row.get::<i64>(0)?,
        project_id: row.get::<i64>(1)?,
        title: row.get::<String>(2)?,
        authors: parse_string_list(&row.get::<String>(3)?)?,
        abstract_text: get_opt_string(row, 4)?,
        publication_date: get_opt_string(row, 5)?,
        year,
        journal: get_opt_string(row, 7)?,
        volume: get_opt_string(row, 8)?,
        issue: get_opt_string(row, 9)?,
        pages: get_opt_string(row, 10)?,
        publication_type: get_opt_string(row, 11)?,
        doi: get_opt_string(row, 12)?,
        pmid: get_opt_string(row, 13)?,
        pmcid: get_opt_string(row, 14)?,
        issn: get_opt_string(row, 15)?,
        keywords: parse_string_list(&row.get::<String>(16)?)?,
        mesh_terms: parse_string_list(&row.get::<String>(17)?)?,
        article_url: get_opt_string(row, 18)?,
        urls: parse_string_list(&row.get::<String>(19)?)?,
        source_filename: get_opt_string(row, 20)?,
        full_text_path: get_opt_string(row, 21)?,
        has_full_text: row.get::<i64>(22)? != 0,
        phase: ScreeningPhase::from(status),
        ai_check_status: parse_enum(&row.get::<String>(24)?)?,
        ai_check_result: parse_optional_json(get_opt_string(row, 25)?.as_deref())?,
        last_ai_check: parse_optional_datetime(get_opt_string(row, 26)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(27)?)?,
        updated_at: parse_datetime(&row.get::<String>(28)?)?,
    })
}

const fn not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "article",
        id,
    }
}

/// Read an article inside `conn`, scoped to its project.
pub(crate) async fn fetch_article_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
) -> Result<Article, DatabaseError> {
    let sql = format!("SELECT {SELECT_COLS} FROM articles a WHERE a.id = ?1 AND a.project_id = ?2");
    let mut rows = conn.query(&sql, [id, project_id]).await?;
    let row = rows.next().await?.ok_or_else(|| not_found(id))?;
    row_to_article(&row)
}

async fn collect_articles(mut rows: libsql::Rows) -> Result<Vec<Article>, DatabaseError> {
    let mut articles = Vec::new();
    while let Some(row) = rows.next().await? {
        articles.push(row_to_article(&row)?);
    }
    Ok(articles)
}

/// Move an article from `from` to `to`, guarded on the phase it was read in.
///
/// Zero rows changed means another writer moved the article first.
pub(crate) async fn set_phase_in(
    conn: &libsql::Connection,
    article: &Article,
    to: ScreeningPhase,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let from = article.phase;
    let changed = conn
        .execute(
            "UPDATE articles SET phase = ?1, updated_at = ?2 WHERE id = ?3 AND phase = ?4",
            libsql::params![
                to.status().as_str(),
                at.to_rfc3339(),
                article.id,
                from.status().as_str()
            ],
        )
        .await?;
    if changed == 0 {
        return Err(DatabaseError::ConcurrencyConflict(format!(
            "article {} is no longer {}",
            article.id,
            from.status()
        )));
    }
    tracing::debug!(article_id = article.id, from = %from.status(), to = %to.status(), "article phase changed");
    append_audit_in(
        conn,
        &AuditRecord::new(
            article.project_id,
            EntityType::Article,
            article.id,
            AuditAction::StatusChanged,
        )
        .with_detail(&StatusChangedDetail {
            from: from.status(),
            to: to.status(),
            reason: Some(reason.to_string()),
        })?,
        at,
    )
    .await
}

/// Stamp the outcome of an AI check on an article.
pub(crate) async fn stamp_ai_check_in(
    conn: &libsql::Connection,
    project_id: i64,
    article_id: i64,
    status: AiCheckStatus,
    result: &AiCheckResult,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE articles SET ai_check_status = ?1, ai_check_result = ?2, last_ai_check = ?3,
                                 updated_at = ?3
             WHERE id = ?4 AND project_id = ?5",
            libsql::params![
                status.as_str(),
                to_json_text(result)?,
                at.to_rfc3339(),
                article_id,
                project_id
            ],
        )
        .await?;
    if changed == 0 {
        return Err(not_found(article_id));
    }
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Article, article_id, AuditAction::AiChecked)
            .with_detail(result)?,
        at,
    )
    .await
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Counts returned by [`SiftService::import_articles`].
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

fn list_or_none(values: &[String]) -> Result<Option<String>, DatabaseError> {
    if values.is_empty() {
        Ok(None)
    } else {
        to_json_text(values).map(Some)
    }
}

fn is_unique_violation(error: &DatabaseError) -> bool {
    matches!(error, DatabaseError::LibSql(libsql::Error::SqliteFailure(code, _)) if code & 0xff == 19)
}

async fn insert_article_in(
    conn: &libsql::Connection,
    project_id: i64,
    input: &NewArticle,
    at: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO articles (project_id, title, authors, abstract, publication_date, year,
                               journal, volume, issue, pages, publication_type, doi, pmid,
                               pmcid, issn, keywords, mesh_terms, article_url, urls,
                               source_filename, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?21)",
        libsql::params![
            project_id,
            input.title.trim(),
            to_json_text(&input.authors)?,
            non_empty(input.abstract_text.as_deref()),
            non_empty(input.publication_date.as_deref()),
            input.year,
            non_empty(input.journal.as_deref()),
            non_empty(input.volume.as_deref()),
            non_empty(input.issue.as_deref()),
            non_empty(input.pages.as_deref()),
            non_empty(input.publication_type.as_deref()),
            non_empty(input.doi.as_deref()),
            non_empty(input.pmid.as_deref()),
            non_empty(input.pmcid.as_deref()),
            non_empty(input.issn.as_deref()),
            to_json_text(&input.keywords)?,
            to_json_text(&input.mesh_terms)?,
            non_empty(input.article_url.as_deref()),
            to_json_text(&input.urls)?,
            non_empty(input.source_filename.as_deref()),
            at.to_rfc3339()
        ],
    )
    .await?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the non-empty bibliographic fields of an existing article.
/// Screening state is never touched.
async fn refresh_article_in(
    conn: &libsql::Connection,
    id: i64,
    input: &NewArticle,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE articles SET
             title = COALESCE(?1, title),
             authors = COALESCE(?2, authors),
             abstract = COALESCE(?3, abstract),
             publication_date = COALESCE(?4, publication_date),
             year = COALESCE(?5, year),
             journal = COALESCE(?6, journal),
             volume = COALESCE(?7, volume),
             issue = COALESCE(?8, issue),
             pages = COALESCE(?9, pages),
             publication_type = COALESCE(?10, publication_type),
             doi = COALESCE(?11, doi),
             pmid = COALESCE(?12, pmid),
             pmcid = COALESCE(?13, pmcid),
             issn = COALESCE(?14, issn),
             keywords = COALESCE(?15, keywords),
             mesh_terms = COALESCE(?16, mesh_terms),
             article_url = COALESCE(?17, article_url),
             urls = COALESCE(?18, urls),
             source_filename = COALESCE(?19, source_filename),
             updated_at = ?20
         WHERE id = ?21",
        libsql::params![
            non_empty(Some(input.title.as_str())),
            list_or_none(&input.authors)?,
            non_empty(input.abstract_text.as_deref()),
            non_empty(input.publication_date.as_deref()),
            input.year,
            non_empty(input.journal.as_deref()),
            non_empty(input.volume.as_deref()),
            non_empty(input.issue.as_deref()),
            non_empty(input.pages.as_deref()),
            non_empty(input.publication_type.as_deref()),
            non_empty(input.doi.as_deref()),
            non_empty(input.pmid.as_deref()),
            non_empty(input.pmcid.as_deref()),
            non_empty(input.issn.as_deref()),
            list_or_none(&input.keywords)?,
            list_or_none(&input.mesh_terms)?,
            non_empty(input.article_url.as_deref()),
            list_or_none(&input.urls)?,
            non_empty(input.source_filename.as_deref()),
            at.to_rfc3339(),
            id
        ],
    )
    .await?;
    Ok(())
}

async fn find_by_key_in(
    conn: &libsql::Connection,
    project_id: i64,
    key: DedupKey,
    value: &str,
) -> Result<Option<i64>, DatabaseError> {
    let sql = format!(
        "SELECT id FROM articles WHERE project_id = ?1 AND {} = ?2",
        key.as_str()
    );
    let mut rows = conn.query(&sql, libsql::params![project_id, value]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row.get::<i64>(0)?)),
        None => Ok(None),
    }
}

async fn import_articles_in(
    conn: &libsql::Connection,
    project_id: i64,
    records: &[NewArticle],
    key: DedupKey,
) -> Result<ImportSummary, DatabaseError> {
    ensure_project_in(conn, project_id).await?;
    let now = Utc::now();
    let mut summary = ImportSummary::default();

    for record in records {
        if let Err(error) = record.validate() {
            tracing::debug!(%error, "skipping invalid import record");
            summary.skipped += 1;
            continue;
        }
        let Some(value) = key.value_of(record) else {
            tracing::debug!(title = %record.title, key = key.as_str(), "skipping record without dedup key");
            summary.skipped += 1;
            continue;
        };

        let outcome = match find_by_key_in(conn, project_id, key, value).await? {
            Some(id) => refresh_article_in(conn, id, record, now).await.map(|()| false),
            None => insert_article_in(conn, project_id, record, now).await.map(|_| true),
        };
        match outcome {
            Ok(true) => summary.created += 1,
            Ok(false) => summary.updated += 1,
            Err(error) if is_unique_violation(&error) => {
                tracing::warn!(%error, key = value, "skipping record colliding with another article");
                summary.skipped += 1;
            }
            Err(error) => return Err(error),
        }
    }

    let source_filename = records
        .iter()
        .find_map(|r| non_empty(r.source_filename.as_deref()))
        .map(str::to_string);
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Project, project_id, AuditAction::Imported)
            .with_detail(&ImportedDetail {
                source_filename,
                created: summary.created,
                updated: summary.updated,
                skipped: summary.skipped,
            })?,
        now,
    )
    .await?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filter for [`SiftService::list_articles`].
#[derive(Debug, Default, Clone)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub stage: Option<ScreeningStage>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

async fn start_screening_in(
    conn: &libsql::Connection,
    project_id: i64,
) -> Result<u64, DatabaseError> {
    ensure_project_in(conn, project_id).await?;
    let sql = format!(
        "SELECT {SELECT_COLS} FROM articles a WHERE a.project_id = ?1 AND a.phase = 'imported' ORDER BY a.id"
    );
    let pending = collect_articles(conn.query(&sql, [project_id]).await?).await?;
    let now = Utc::now();
    let mut started = 0;
    for article in &pending {
        if let Some(to) = article.phase.start_screening() {
            set_phase_in(conn, article, to, "screening started", now).await?;
            started += 1;
        }
    }
    Ok(started)
}

async fn attach_full_text_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
    path: &str,
    content: Option<&str>,
) -> Result<Article, DatabaseError> {
    let article = fetch_article_in(conn, project_id, id).await?;
    let now = Utc::now();
    conn.execute(
        "UPDATE articles SET full_text_path = ?1, full_text_content = ?2, updated_at = ?3
         WHERE id = ?4",
        libsql::params![path, content, now.to_rfc3339(), id],
    )
    .await?;

    let to = article.phase.attach_full_text();
    if to == article.phase {
        append_audit_in(
            conn,
            &AuditRecord::new(project_id, EntityType::Article, id, AuditAction::Updated)
                .with_detail(&serde_json::json!({ "full_text_path": path }))?,
            now,
        )
        .await?;
    } else {
        set_phase_in(conn, &article, to, "full text attached", now).await?;
    }
    fetch_article_in(conn, project_id, id).await
}

async fn delete_article_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "DELETE FROM articles WHERE id = ?1 AND project_id = ?2",
            [id, project_id],
        )
        .await?;
    if changed == 0 {
        return Err(not_found(id));
    }
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Article, id, AuditAction::Deleted),
        Utc::now(),
    )
    .await
}

impl SiftService {
    /// Create one article in `imported`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank title and
    /// `DatabaseError::NotFound` for an unknown project.
    pub async fn create_article(
        &self,
        project_id: i64,
        input: &NewArticle,
    ) -> Result<Article, DatabaseError> {
        input.validate()?;
        let unit = self.begin_unit().await?;
        let result: Result<Article, DatabaseError> = async {
            ensure_project_in(&unit, project_id).await?;
            let now = Utc::now();
            let id = insert_article_in(&unit, project_id, input, now).await?;
            append_audit_in(
                &unit,
                &AuditRecord::new(project_id, EntityType::Article, id, AuditAction::Created),
                now,
            )
            .await?;
            fetch_article_in(&unit, project_id, id).await
        }
        .await;
        unit.finish(result).await
    }

    /// Upsert parsed records keyed on DOI or PMID, all in one transaction.
    ///
    /// Existing articles get their non-empty fields overwritten and keep their
    /// screening state. Records without a title or without the key are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project; nothing is
    /// imported when any statement fails.
    pub async fn import_articles(
        &self,
        project_id: i64,
        records: &[NewArticle],
        key: DedupKey,
    ) -> Result<ImportSummary, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = import_articles_in(&unit, project_id, records, key).await;
        let summary = unit.finish(result).await?;
        tracing::info!(
            project_id,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "articles imported"
        );
        Ok(summary)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn get_article(&self, project_id: i64, id: i64) -> Result<Article, DatabaseError> {
        fetch_article_in(self.db().reader(), project_id, id).await
    }

    /// List a project's articles in id order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_articles(
        &self,
        project_id: i64,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, DatabaseError> {
        let mut conditions = vec!["a.project_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Integer(project_id)];

        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("a.phase = ?{}", params.len()));
        }
        if let Some(stage) = filter.stage {
            params.push(libsql::Value::Text(stage.as_str().to_string()));
            conditions.push(format!("a.current_stage = ?{}", params.len()));
        }

        let limit = filter.limit.map_or(-1, i64::from);
        let offset = filter.offset.unwrap_or(0);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM articles a WHERE {} ORDER BY a.id LIMIT {limit} OFFSET {offset}",
            conditions.join(" AND ")
        );
        let rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        collect_articles(rows).await
    }

    /// Open articles whose latest decision at their current stage is
    /// `uncertain`. These never come back through the next-article queue
    /// under the strict policy.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_uncertain_articles(
        &self,
        project_id: i64,
    ) -> Result<Vec<Article>, DatabaseError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM articles a
             WHERE a.project_id = ?1
               AND a.current_stage != 'completed'
               AND (SELECT d.decision FROM screening_decisions d
                    WHERE d.article_id = a.id AND d.stage = a.current_stage
                    ORDER BY d.id DESC LIMIT 1) = 'uncertain'
             ORDER BY a.id"
        );
        let rows = self.db().query_with(&sql, || [project_id]).await?;
        collect_articles(rows).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn delete_article(&self, project_id: i64, id: i64) -> Result<(), DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = delete_article_in(&unit, project_id, id).await;
        unit.finish(result).await
    }

    /// Move every `imported` article of the project to `screening`.
    /// Returns how many articles moved.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project.
    pub async fn start_screening(&self, project_id: i64) -> Result<u64, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = start_screening_in(&unit, project_id).await;
        let started = unit.finish(result).await?;
        tracing::info!(project_id, started, "title/abstract screening started");
        Ok(started)
    }

    /// Store a full-text document. An article awaiting full text moves to
    /// `full_text_retrieved`; any other phase is left as it is.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn attach_full_text(
        &self,
        project_id: i64,
        id: i64,
        path: &str,
        content: Option<&str>,
    ) -> Result<Article, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = attach_full_text_in(&unit, project_id, id, path, content).await;
        unit.finish(result).await
    }

    /// Extracted full-text content, if any was stored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn article_full_text(
        &self,
        project_id: i64,
        id: i64,
    ) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT full_text_content FROM articles WHERE id = ?1 AND project_id = ?2",
                || [id, project_id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| not_found(id))?;
        get_opt_string(&row, 0)
    }

    /// Record a failed AI check. No decision is written and the article
    /// stays where it is.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the article is absent from the project.
    pub async fn mark_ai_check_error(
        &self,
        project_id: i64,
        article_id: i64,
        message: &str,
    ) -> Result<Article, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result: Result<Article, DatabaseError> = async {
            stamp_ai_check_in(
                &unit,
                project_id,
                article_id,
                AiCheckStatus::Error,
                &AiCheckResult::error(message),
                Utc::now(),
            )
            .await?;
            fetch_article_in(&unit, project_id, article_id).await
        }
        .await;
        unit.finish(result).await
    }

    /// PMIDs of the project's articles that have no abstract yet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn pmids_missing_abstract(&self, project_id: i64) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT pmid FROM articles
                 WHERE project_id = ?1 AND pmid IS NOT NULL
                   AND (abstract IS NULL OR abstract = '')
                 ORDER BY id",
                || [project_id],
            )
            .await?;
        let mut pmids = Vec::new();
        while let Some(row) = rows.next().await? {
            pmids.push(row.get::<String>(0)?);
        }
        Ok(pmids)
    }

    /// Set abstracts, keyed by PMID, on articles that still lack one.
    /// Returns the number of articles changed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project.
    pub async fn fill_missing_abstracts(
        &self,
        project_id: i64,
        abstracts: &BTreeMap<String, String>,
    ) -> Result<u64, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result: Result<u64, DatabaseError> = async {
            ensure_project_in(&unit, project_id).await?;
            let now = Utc::now().to_rfc3339();
            let mut filled = 0;
            for (pmid, text) in abstracts {
                let Some(text) = non_empty(Some(text.as_str())) else {
                    continue;
                };
                filled += unit
                    .execute(
                        "UPDATE articles SET abstract = ?1, updated_at = ?2
                         WHERE project_id = ?3 AND pmid = ?4
                           AND (abstract IS NULL OR abstract = '')",
                        libsql::params![text, now.as_str(), project_id, pmid.as_str()],
                    )
                    .await?;
            }
            Ok(filled)
        }
        .await;
        let filled = unit.finish(result).await?;
        tracing::info!(project_id, filled, "abstracts filled");
        Ok(filled)
    }
}
