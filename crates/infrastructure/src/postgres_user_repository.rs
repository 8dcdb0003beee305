use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use taskhive_application::UserRepository;
use taskhive_core::{AppError, AppResult, OrganizationId, UserId};
use taskhive_domain::{EmailAddress, User, UserStatus};
use uuid::Uuid;

/// PostgreSQL-backed repository for user records.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    status: String,
    organization_id: Uuid,
}

impl UserRow {
    fn into_domain(self) -> AppResult<User> {
        let mut user = User::new(
            UserId::from_uuid(self.id),
            self.email,
            self.first_name,
            self.last_name,
            OrganizationId::from_uuid(self.organization_id),
        )?;
        user.set_status(UserStatus::from_str(self.status.as_str())?);
        Ok(user)
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, email, first_name, last_name, status, organization_id FROM users";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load user by email: {error}"))
            })?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, status, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email().as_str())
        .bind(user.first_name().as_str())
        .bind(user.last_name().as_str())
        .bind(user.status().as_str())
        .bind(user.organization_id().as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation())
            {
                AppError::Conflict(format!("user '{}' already exists", user.email()))
            } else {
                AppError::Internal(format!("failed to insert user: {error}"))
            }
        })?;

        Ok(())
    }

    async fn update_user(&self, user: User) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, status = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email().as_str())
        .bind(user.first_name().as_str())
        .bind(user.last_name().as_str())
        .bind(user.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user: {error}")))?;

        Ok(())
    }

    async fn list_users_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<User>> {
        let ids: Vec<Uuid> = organization_ids.iter().map(OrganizationId::as_uuid).collect();
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_COLUMNS} WHERE organization_id = ANY($1) ORDER BY email"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserRow::into_domain).collect()
    }

    async fn count_users_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE organization_id = $1")
                .bind(organization_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))?;

        Ok(count as u64)
    }
}
