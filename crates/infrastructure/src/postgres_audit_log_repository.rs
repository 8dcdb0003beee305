use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use taskhive_application::{AuditLogRepository, AuditQuery, AuditRecord};
use taskhive_core::{AppError, AppResult, AuditRecordId, OrganizationId, UserId};
use taskhive_domain::AuditAction;
use uuid::Uuid;

/// PostgreSQL-backed append-only audit log.
///
/// Only `INSERT` and `SELECT` are ever issued against the table.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    action: String,
    resource: String,
    resource_id: Option<String>,
    user_id: Option<Uuid>,
    organization_id: Uuid,
    details: Option<String>,
    success: bool,
    error_message: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditLogRow {
    fn into_domain(self) -> AppResult<AuditRecord> {
        Ok(AuditRecord {
            id: AuditRecordId::from_uuid(self.id),
            action: AuditAction::from_str(self.action.as_str())?,
            resource: self.resource,
            resource_id: self.resource_id,
            user_id: self.user_id.map(UserId::from_uuid),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            details: self
                .details
                .as_deref()
                .and_then(|text| serde_json::from_str(text).ok()),
            success: self.success,
            error_message: self.error_message,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        })
    }
}

const FILTER_CLAUSE: &str = r#"
    organization_id = $1
    AND ($2::UUID IS NULL OR user_id = $2)
    AND ($3::TEXT IS NULL OR resource = $3)
    AND ($4::TEXT IS NULL OR action = $4)
    AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
    AND ($6::TIMESTAMPTZ IS NULL OR created_at <= $6)
"#;

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        let details = record
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to serialize audit details: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, action, resource, resource_id, user_id, organization_id,
                details, success, error_message, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.action.as_str())
        .bind(record.resource.as_str())
        .bind(record.resource_id.as_deref())
        .bind(record.user_id.map(|id| id.as_uuid()))
        .bind(record.organization_id.as_uuid())
        .bind(details.as_deref())
        .bind(record.success)
        .bind(record.error_message.as_deref())
        .bind(record.ip_address.as_deref())
        .bind(record.user_agent.as_deref())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append audit record: {error}"))
        })?;

        Ok(())
    }

    async fn query(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<AuditRecord>, u64)> {
        let actor_id = query.actor_id.map(|id| id.as_uuid());
        let action = query.action.map(|action| action.as_str().to_owned());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM audit_logs WHERE {FILTER_CLAUSE}"
        ))
        .bind(organization_id.as_uuid())
        .bind(actor_id)
        .bind(query.resource.as_deref())
        .bind(action.as_deref())
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count audit records: {error}"))
        })?;

        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            r#"
            SELECT id, action, resource, resource_id, user_id, organization_id,
                details, success, error_message, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE {FILTER_CLAUSE}
            ORDER BY created_at DESC
            LIMIT $7
            OFFSET $8
            "#
        ))
        .bind(organization_id.as_uuid())
        .bind(actor_id)
        .bind(query.resource.as_deref())
        .bind(action.as_deref())
        .bind(query.from)
        .bind(query.to)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit records: {error}"))
        })?;

        let records = rows
            .into_iter()
            .map(AuditLogRow::into_domain)
            .collect::<AppResult<Vec<AuditRecord>>>()?;

        Ok((records, total as u64))
    }
}
