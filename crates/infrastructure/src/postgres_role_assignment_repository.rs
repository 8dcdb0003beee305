use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use taskhive_application::RoleAssignmentRepository;
use taskhive_core::{AppError, AppResult, OrganizationId, RoleAssignmentId, UserId};
use taskhive_domain::{RoleAssignment, RoleName};
use uuid::Uuid;

/// PostgreSQL-backed repository for role assignments.
#[derive(Clone)]
pub struct PostgresRoleAssignmentRepository {
    pool: PgPool,
}

impl PostgresRoleAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    id: Uuid,
    user_id: Uuid,
    role: String,
    organization_id: Option<Uuid>,
    is_active: bool,
}

impl RoleAssignmentRow {
    fn into_domain(self) -> AppResult<RoleAssignment> {
        let mut assignment = RoleAssignment::new(
            RoleAssignmentId::from_uuid(self.id),
            UserId::from_uuid(self.user_id),
            RoleName::from_str(self.role.as_str())?,
            self.organization_id.map(OrganizationId::from_uuid),
        );
        if !self.is_active {
            assignment.deactivate();
        }
        Ok(assignment)
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresRoleAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT id, user_id, role, organization_id, is_active
            FROM role_assignments
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        rows.into_iter()
            .map(RoleAssignmentRow::into_domain)
            .collect()
    }

    async fn insert(&self, assignment: RoleAssignment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_assignments (id, user_id, role, organization_id, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.user_id().as_uuid())
        .bind(assignment.role().as_str())
        .bind(assignment.organization_id().map(|id| id.as_uuid()))
        .bind(assignment.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert role assignment: {error}"))
        })?;

        Ok(())
    }

    async fn deactivate(
        &self,
        user_id: UserId,
        role: RoleName,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_active = FALSE, updated_at = now()
            WHERE user_id = $1
                AND role = $2
                AND ($3::UUID IS NULL OR organization_id = $3)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .bind(organization_id.map(|id| id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate role assignment: {error}"))
        })?;

        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_active = FALSE, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate role assignments: {error}"))
        })?;

        Ok(())
    }
}
