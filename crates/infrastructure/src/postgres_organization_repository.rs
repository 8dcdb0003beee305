use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use taskhive_application::OrganizationRepository;
use taskhive_core::{AppError, AppResult, OrganizationId};
use taskhive_domain::Organization;
use uuid::Uuid;

/// PostgreSQL-backed repository for organization records.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    parent_id: Option<Uuid>,
}

impl OrganizationRow {
    fn into_domain(self) -> AppResult<Organization> {
        Organization::new(
            OrganizationId::from_uuid(self.id),
            self.name,
            self.description,
            self.parent_id.map(OrganizationId::from_uuid),
        )
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, parent_id FROM organizations";

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn find(&self, organization_id: OrganizationId) -> AppResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(organization_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load organization: {error}"))
            })?;

        row.map(OrganizationRow::into_domain).transpose()
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        let row =
            sqlx::query_as::<_, OrganizationRow>(&format!("{SELECT_COLUMNS} WHERE name = $1"))
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to load organization by name: {error}"))
                })?;

        row.map(OrganizationRow::into_domain).transpose()
    }

    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "{SELECT_COLUMNS} WHERE parent_id = $1 ORDER BY name"
        ))
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list child organizations: {error}"))
        })?;

        rows.into_iter()
            .map(OrganizationRow::into_domain)
            .collect()
    }

    async fn list_by_ids(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<Organization>> {
        let ids: Vec<Uuid> = organization_ids.iter().map(OrganizationId::as_uuid).collect();
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = ANY($1) ORDER BY name"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list organizations: {error}"))
        })?;

        rows.into_iter()
            .map(OrganizationRow::into_domain)
            .collect()
    }

    async fn insert(&self, organization: Organization) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, description, parent_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(organization.name().as_str())
        .bind(organization.description())
        .bind(organization.parent_id().map(|id| id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation())
            {
                AppError::Conflict(format!(
                    "organization '{}' already exists",
                    organization.name().as_str()
                ))
            } else {
                AppError::Internal(format!("failed to insert organization: {error}"))
            }
        })?;

        Ok(())
    }

    async fn update(&self, organization: Organization) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE organizations
            SET name = $2, description = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(organization.name().as_str())
        .bind(organization.description())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update organization: {error}"))
        })?;

        Ok(())
    }

    async fn delete(&self, organization_id: OrganizationId) -> AppResult<()> {
        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(organization_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete organization: {error}"))
            })?;

        Ok(())
    }
}
