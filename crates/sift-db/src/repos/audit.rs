//! Audit trail repository.
//!
//! Append-only audit entries recording every mutation, written inside the
//! same transaction as the mutation itself.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sift_core::entities::AuditEntry;
use sift_core::enums::{AuditAction, EntityType};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::SiftService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub project_id: Option<i64>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

/// An audit entry about to be written.
#[derive(Debug, Clone)]
pub(crate) struct AuditRecord {
    pub project_id: Option<i64>,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub action: AuditAction,
    pub detail: Option<serde_json::Value>,
}

impl AuditRecord {
    pub(crate) const fn new(
        project_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        action: AuditAction,
    ) -> Self {
        Self {
            project_id: Some(project_id),
            entity_type,
            entity_id,
            action,
            detail: None,
        }
    }

    pub(crate) fn with_detail<T: Serialize>(mut self, detail: &T) -> Result<Self, DatabaseError> {
        self.detail = Some(serde_json::to_value(detail)?);
        Ok(self)
    }
}

/// Append an audit entry on `conn` (normally an open write unit).
pub(crate) async fn append_audit_in(
    conn: &libsql::Connection,
    record: &AuditRecord,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let detail = record
        .detail
        .as_ref()
        .map(std::string::ToString::to_string);
    conn.execute(
        "INSERT INTO audit_trail (project_id, entity_type, entity_id, action, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        libsql::params![
            record.project_id,
            record.entity_type.as_str(),
            record.entity_id,
            record.action.as_str(),
            detail.as_deref(),
            at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

impl SiftService {
    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(project_id) = filter.project_id {
            params.push(libsql::Value::Integer(project_id));
            conditions.push(format!("project_id = ?{}", params.len()));
        }
        if let Some(ref et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(eid) = filter.entity_id {
            params.push(libsql::Value::Integer(eid));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, project_id, entity_type, entity_id, action, detail, created_at
             FROM audit_trail {where_clause}
             ORDER BY id DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().await? {
            entries.push(AuditEntry {
                id: row.get::<i64>(0)?,
                project_id: row.get::<Option<i64>>(1)?,
                entity_type: parse_enum(&row.get::<String>(2)?)?,
                entity_id: row.get::<i64>(3)?,
                action: parse_enum(&row.get::<String>(4)?)?,
                detail: parse_optional_json(get_opt_string(&row, 5)?.as_deref())?,
                created_at: parse_datetime(&row.get::<String>(6)?)?,
            });
        }

        Ok(entries)
    }
}
