//! Criterion repository: CRUD, activation, ordering.
//!
//! Criteria are ordered within `(project, type)`. Editing or deactivating a
//! criterion never touches decisions that already cite its code.

use chrono::Utc;
use sift_core::audit_detail::ReorderedDetail;
use sift_core::entities::Criterion;
use sift_core::enums::{AuditAction, CriterionType, EntityType};
use sift_core::inputs::NewCriterion;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_datetime, parse_enum};
use crate::repos::audit::{AuditRecord, append_audit_in};
use crate::repos::project::ensure_project_in;
use crate::service::SiftService;
use crate::updates::criterion::CriterionUpdate;

const SELECT_COLS: &str = "id, project_id, criterion_type, code, description, rationale, \
                           sort_order, is_active, created_at, updated_at";

/// Inclusion criteria first, then by order within type.
const ORDER_BY: &str =
    "CASE criterion_type WHEN 'inclusion' THEN 0 ELSE 1 END, sort_order, id";

fn row_to_criterion(row: &libsql::Row) -> Result<Criterion, DatabaseError> {
    Ok(Criterion {
        id: row.get::<i64>(0)?,
        project_id: row.get::<i64>(1)?,
        criterion_type: parse_enum(&row.get::<String>(2)?)?,
        code: row.get::<String>(3)?,
        description: row.get::<String>(4)?,
        rationale: get_opt_string(row, 5)?,
        order: row.get::<i64>(6)?,
        is_active: get_bool(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

const fn not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "criterion",
        id,
    }
}

async fn next_order_in(
    conn: &libsql::Connection,
    project_id: i64,
    criterion_type: CriterionType,
) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT MAX(sort_order) FROM criteria WHERE project_id = ?1 AND criterion_type = ?2",
            libsql::params![project_id, criterion_type.as_str()],
        )
        .await?;
    let max = match rows.next().await? {
        Some(row) => row.get::<Option<i64>>(0)?,
        None => None,
    };
    Ok(max.map_or(0, |max| max + 1))
}

async fn fetch_criterion_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
) -> Result<Criterion, DatabaseError> {
    let sql = format!("SELECT {SELECT_COLS} FROM criteria WHERE id = ?1 AND project_id = ?2");
    let mut rows = conn.query(&sql, [id, project_id]).await?;
    let row = rows.next().await?.ok_or_else(|| not_found(id))?;
    row_to_criterion(&row)
}

async fn create_criterion_in(
    conn: &libsql::Connection,
    project_id: i64,
    input: &NewCriterion,
) -> Result<Criterion, DatabaseError> {
    ensure_project_in(conn, project_id).await?;
    let order = match input.explicit_order() {
        Some(order) => order,
        None => next_order_in(conn, project_id, input.criterion_type).await?,
    };
    let now = Utc::now();
    conn.execute(
        "INSERT INTO criteria (project_id, criterion_type, code, description, rationale,
                               sort_order, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        libsql::params![
            project_id,
            input.criterion_type.as_str(),
            input.code.as_str(),
            input.description.as_str(),
            input.rationale.as_deref(),
            order,
            i64::from(input.is_active),
            now.to_rfc3339()
        ],
    )
    .await?;
    let id = conn.last_insert_rowid();
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Criterion, id, AuditAction::Created),
        now,
    )
    .await?;
    fetch_criterion_in(conn, project_id, id).await
}

async fn update_criterion_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
    update: &CriterionUpdate,
) -> Result<Criterion, DatabaseError> {
    let now = Utc::now();
    let mut sets = Vec::new();
    let mut params: Vec<libsql::Value> = Vec::new();

    if let Some(criterion_type) = update.criterion_type {
        params.push(libsql::Value::Text(criterion_type.as_str().to_string()));
        sets.push(format!("criterion_type = ?{}", params.len()));
    }
    if let Some(ref code) = update.code {
        params.push(libsql::Value::Text(code.clone()));
        sets.push(format!("code = ?{}", params.len()));
    }
    if let Some(ref description) = update.description {
        params.push(libsql::Value::Text(description.clone()));
        sets.push(format!("description = ?{}", params.len()));
    }
    if let Some(ref rationale) = update.rationale {
        params.push(rationale.clone().map_or(libsql::Value::Null, libsql::Value::Text));
        sets.push(format!("rationale = ?{}", params.len()));
    }
    if let Some(order) = update.order {
        params.push(libsql::Value::Integer(order));
        sets.push(format!("sort_order = ?{}", params.len()));
    }
    if let Some(is_active) = update.is_active {
        params.push(libsql::Value::Integer(i64::from(is_active)));
        sets.push(format!("is_active = ?{}", params.len()));
    }

    params.push(libsql::Value::Text(now.to_rfc3339()));
    sets.push(format!("updated_at = ?{}", params.len()));
    params.push(libsql::Value::Integer(id));
    let id_idx = params.len();
    params.push(libsql::Value::Integer(project_id));
    let sql = format!(
        "UPDATE criteria SET {} WHERE id = ?{id_idx} AND project_id = ?{}",
        sets.join(", "),
        params.len()
    );

    let changed = conn.execute(&sql, libsql::params_from_iter(params)).await?;
    if changed == 0 {
        return Err(not_found(id));
    }
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Criterion, id, AuditAction::Updated)
            .with_detail(update)?,
        now,
    )
    .await?;
    fetch_criterion_in(conn, project_id, id).await
}

async fn delete_criterion_in(
    conn: &libsql::Connection,
    project_id: i64,
    id: i64,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "DELETE FROM criteria WHERE id = ?1 AND project_id = ?2",
            [id, project_id],
        )
        .await?;
    if changed == 0 {
        return Err(not_found(id));
    }
    append_audit_in(
        conn,
        &AuditRecord::new(project_id, EntityType::Criterion, id, AuditAction::Deleted),
        Utc::now(),
    )
    .await
}

async fn reorder_criteria_in(
    conn: &libsql::Connection,
    project_id: i64,
    ordered_ids: &[i64],
) -> Result<u64, DatabaseError> {
    let now = Utc::now();
    let mut moved = 0;
    for (position, id) in ordered_ids.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|e| DatabaseError::InvalidState(format!("reorder position: {e}")))?;
        let current = match fetch_criterion_in(conn, project_id, *id).await {
            Ok(criterion) => criterion.order,
            Err(DatabaseError::NotFound { .. }) => {
                tracing::debug!(project_id, criterion_id = id, "skipping foreign criterion in reorder");
                continue;
            }
            Err(error) => return Err(error),
        };
        if current == position {
            continue;
        }
        conn.execute(
            "UPDATE criteria SET sort_order = ?1, updated_at = ?2 WHERE id = ?3 AND project_id = ?4",
            libsql::params![position, now.to_rfc3339(), *id, project_id],
        )
        .await?;
        append_audit_in(
            conn,
            &AuditRecord::new(project_id, EntityType::Criterion, *id, AuditAction::Reordered)
                .with_detail(&ReorderedDetail {
                    from: current,
                    to: position,
                })?,
            now,
        )
        .await?;
        moved += 1;
    }
    Ok(moved)
}

impl SiftService {
    /// Create a criterion. A missing or zero `order` appends after the last
    /// criterion of the same type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for out-of-range fields and
    /// `DatabaseError::NotFound` for an unknown project.
    pub async fn create_criterion(
        &self,
        project_id: i64,
        input: &NewCriterion,
    ) -> Result<Criterion, DatabaseError> {
        input.validate()?;
        let unit = self.begin_unit().await?;
        let result = create_criterion_in(&unit, project_id, input).await;
        unit.finish(result).await
    }

    /// Order the next criterion of `criterion_type` would receive.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn next_criterion_order(
        &self,
        project_id: i64,
        criterion_type: CriterionType,
    ) -> Result<i64, DatabaseError> {
        next_order_in(self.db().reader(), project_id, criterion_type).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the criterion is absent from the project.
    pub async fn get_criterion(&self, project_id: i64, id: i64) -> Result<Criterion, DatabaseError> {
        fetch_criterion_in(self.db().reader(), project_id, id).await
    }

    /// List a project's criteria, inclusion first, each type by order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_criteria(
        &self,
        project_id: i64,
        active_only: bool,
    ) -> Result<Vec<Criterion>, DatabaseError> {
        let active_clause = if active_only { "AND is_active = 1" } else { "" };
        let sql = format!(
            "SELECT {SELECT_COLS} FROM criteria WHERE project_id = ?1 {active_clause} ORDER BY {ORDER_BY}"
        );
        let mut rows = self.db().query_with(&sql, || [project_id]).await?;
        let mut criteria = Vec::new();
        while let Some(row) = rows.next().await? {
            criteria.push(row_to_criterion(&row)?);
        }
        Ok(criteria)
    }

    /// Partially update a criterion.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the criterion is absent from the project.
    pub async fn update_criterion(
        &self,
        project_id: i64,
        id: i64,
        update: &CriterionUpdate,
    ) -> Result<Criterion, DatabaseError> {
        update.validate()?;
        let unit = self.begin_unit().await?;
        let result = update_criterion_in(&unit, project_id, id, update).await;
        unit.finish(result).await
    }

    /// Activate or deactivate a criterion without deleting it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the criterion is absent from the project.
    pub async fn set_criterion_active(
        &self,
        project_id: i64,
        id: i64,
        is_active: bool,
    ) -> Result<Criterion, DatabaseError> {
        let update = CriterionUpdate {
            is_active: Some(is_active),
            ..CriterionUpdate::default()
        };
        self.update_criterion(project_id, id, &update).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the criterion is absent from the project.
    pub async fn delete_criterion(&self, project_id: i64, id: i64) -> Result<(), DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = delete_criterion_in(&unit, project_id, id).await;
        unit.finish(result).await
    }

    /// Set `order = position` for each id in `ordered_ids` that belongs to
    /// the project. Ids from other projects are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if an update fails; nothing is applied then.
    pub async fn reorder_criteria(
        &self,
        project_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<Criterion>, DatabaseError> {
        let unit = self.begin_unit().await?;
        let result = reorder_criteria_in(&unit, project_id, ordered_ids).await;
        let moved = unit.finish(result).await?;
        tracing::debug!(project_id, moved, "criteria reordered");
        self.list_criteria(project_id, false).await
    }
}
