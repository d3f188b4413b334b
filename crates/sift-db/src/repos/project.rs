//! Project repository.

use chrono::Utc;
use sift_core::entities::Project;
use sift_core::enums::{AuditAction, EntityType};
use sift_core::inputs::NewProject;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::repos::audit::{AuditRecord, append_audit_in};
use crate::service::SiftService;
use crate::updates::project::ProjectUpdate;

const SELECT_COLS: &str =
    "id, name, description, review_question, owner_id, created_at, updated_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get::<i64>(0)?,
        name: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        review_question: get_opt_string(row, 3)?,
        owner_id: row.get::<Option<i64>>(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Fail with `NotFound` unless the project exists.
pub(crate) async fn ensure_project_in(
    conn: &libsql::Connection,
    project_id: i64,
) -> Result<(), DatabaseError> {
    let mut rows = conn
        .query("SELECT 1 FROM projects WHERE id = ?1", [project_id])
        .await?;
    if rows.next().await?.is_none() {
        return Err(DatabaseError::NotFound {
            entity: "project",
            id: project_id,
        });
    }
    Ok(())
}

impl SiftService {
    /// Create a new project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name, or the INSERT error.
    pub async fn create_project(&self, input: &NewProject) -> Result<Project, DatabaseError> {
        input.validate()?;
        let unit = self.begin_unit().await?;
        let now = Utc::now();
        let result: Result<Project, DatabaseError> = async {
            unit.execute(
                "INSERT INTO projects (name, description, review_question, owner_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                libsql::params![
                    input.name.trim(),
                    input.description.as_deref(),
                    input.review_question.as_deref(),
                    input.owner_id,
                    now.to_rfc3339()
                ],
            )
            .await?;
            let id = unit.last_insert_rowid();
            append_audit_in(
                &unit,
                &AuditRecord::new(id, EntityType::Project, id, AuditAction::Created),
                now,
            )
            .await?;
            Ok(Project {
                id,
                name: input.name.trim().to_string(),
                description: input.description.clone(),
                review_question: input.review_question.clone(),
                owner_id: input.owner_id,
                created_at: now,
                updated_at: now,
            })
        }
        .await;
        unit.finish(result).await
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn get_project(&self, id: i64) -> Result<Project, DatabaseError> {
        let sql = format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1");
        let mut rows = self.db().query_with(&sql, || [id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NotFound {
            entity: "project",
            id,
        })?;
        row_to_project(&row)
    }

    /// List projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(&self, limit: u32) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!("SELECT {SELECT_COLS} FROM projects ORDER BY id DESC LIMIT ?1");
        let mut rows = self.db().query_with(&sql, || [limit]).await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// Update a project with dynamic SET clauses.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn update_project(
        &self,
        id: i64,
        update: &ProjectUpdate,
    ) -> Result<Project, DatabaseError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DatabaseError::Validation(
                    "project name must not be empty".into(),
                ));
            }
        }

        let now = Utc::now();
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref name) = update.name {
            params.push(libsql::Value::Text(name.trim().to_string()));
            sets.push(format!("name = ?{}", params.len()));
        }
        if let Some(ref description) = update.description {
            params.push(description.clone().map_or(libsql::Value::Null, libsql::Value::Text));
            sets.push(format!("description = ?{}", params.len()));
        }
        if let Some(ref question) = update.review_question {
            params.push(question.clone().map_or(libsql::Value::Null, libsql::Value::Text));
            sets.push(format!("review_question = ?{}", params.len()));
        }

        params.push(libsql::Value::Text(now.to_rfc3339()));
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(libsql::Value::Integer(id));
        let sql = format!(
            "UPDATE projects SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );

        let unit = self.begin_unit().await?;
        let result: Result<(), DatabaseError> = async {
            let changed = unit
                .execute(&sql, libsql::params_from_iter(params.clone()))
                .await?;
            if changed == 0 {
                return Err(DatabaseError::NotFound {
                    entity: "project",
                    id,
                });
            }
            append_audit_in(
                &unit,
                &AuditRecord::new(id, EntityType::Project, id, AuditAction::Updated)
                    .with_detail(update)?,
                now,
            )
            .await?;
            Ok(())
        }
        .await;
        unit.finish(result).await?;
        self.get_project(id).await
    }

    /// Delete a project together with its criteria, articles and decisions.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn delete_project(&self, id: i64) -> Result<(), DatabaseError> {
        let unit = self.begin_unit().await?;
        let result: Result<(), DatabaseError> = async {
            let changed = unit
                .execute("DELETE FROM projects WHERE id = ?1", [id])
                .await?;
            if changed == 0 {
                return Err(DatabaseError::NotFound {
                    entity: "project",
                    id,
                });
            }
            append_audit_in(
                &unit,
                &AuditRecord::new(id, EntityType::Project, id, AuditAction::Deleted),
                Utc::now(),
            )
            .await
        }
        .await;
        unit.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{seed_project, test_service};
    use crate::updates::project::ProjectUpdateBuilder;

    #[tokio::test]
    async fn create_project_roundtrip() {
        let svc = test_service().await;
        let project = svc
            .create_project(&NewProject {
                name: "  Exercise and depression ".into(),
                review_question: Some("Does exercise help?".into()),
                owner_id: Some(3),
                ..NewProject::default()
            })
            .await
            .unwrap();

        assert_eq!(project.name, "Exercise and depression");
        let fetched = svc.get_project(project.id).await.unwrap();
        assert_eq!(fetched, project);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let svc = test_service().await;
        let err = svc.create_project(&NewProject::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn update_review_question_only() {
        let svc = test_service().await;
        let project = seed_project(&svc).await;
        let update = ProjectUpdateBuilder::new()
            .review_question(Some("Is X better than Y?".into()))
            .build();
        let updated = svc.update_project(project.id, &update).await.unwrap();

        assert_eq!(updated.review_question.as_deref(), Some("Is X better than Y?"));
        assert_eq!(updated.name, project.name);

        let audit = svc
            .query_audit(&AuditFilter {
                entity_type: Some(EntityType::Project),
                action: Some(AuditAction::Updated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let svc = test_service().await;
        assert!(matches!(
            svc.get_project(99).await,
            Err(DatabaseError::NotFound { entity: "project", id: 99 })
        ));
        assert!(matches!(
            svc.delete_project(99).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_projects_newest_first() {
        let svc = test_service().await;
        let first = seed_project(&svc).await;
        let second = seed_project(&svc).await;
        let projects = svc.list_projects(10).await.unwrap();
        assert_eq!(
            projects.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }
}
