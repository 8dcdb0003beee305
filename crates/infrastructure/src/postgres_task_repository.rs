use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use taskhive_application::{TaskListFilter, TaskPage, TaskRepository};
use taskhive_core::{AppError, AppResult, OrganizationId, TaskId, UserId};
use taskhive_domain::{Task, TaskCategory, TaskPriority, TaskStatus};
use uuid::Uuid;

/// PostgreSQL-backed repository for task records.
#[derive(Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    category: String,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    assignee_id: Option<Uuid>,
    created_by: Uuid,
    organization_id: Uuid,
}

impl TaskRow {
    fn into_domain(self) -> AppResult<Task> {
        let mut task = Task::new(
            TaskId::from_uuid(self.id),
            self.title,
            self.description,
            UserId::from_uuid(self.created_by),
            OrganizationId::from_uuid(self.organization_id),
        )?;
        task.set_priority(TaskPriority::from_str(self.priority.as_str())?);
        task.set_category(TaskCategory::from_str(self.category.as_str())?);
        task.set_due_date(self.due_date);
        task.set_assignee(self.assignee_id.map(UserId::from_uuid));
        task.restore_status(TaskStatus::from_str(self.status.as_str())?, self.completed_at);
        Ok(task)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, title, description, status, priority, category, \
    due_date, completed_at, assignee_id, created_by, organization_id FROM tasks";

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert(&self, task: Task) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, description, status, priority, category,
                due_date, completed_at, assignee_id, created_by, organization_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(task.id().as_uuid())
        .bind(task.title().as_str())
        .bind(task.description())
        .bind(task.status().as_str())
        .bind(task.priority().as_str())
        .bind(task.category().as_str())
        .bind(task.due_date())
        .bind(task.completed_at())
        .bind(task.assignee_id().map(|id| id.as_uuid()))
        .bind(task.created_by().as_uuid())
        .bind(task.organization_id().as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert task: {error}")))?;

        Ok(())
    }

    async fn find(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(task_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load task: {error}")))?;

        row.map(TaskRow::into_domain).transpose()
    }

    async fn update(&self, task: Task) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5, category = $6,
                due_date = $7, completed_at = $8, assignee_id = $9, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(task.id().as_uuid())
        .bind(task.title().as_str())
        .bind(task.description())
        .bind(task.status().as_str())
        .bind(task.priority().as_str())
        .bind(task.category().as_str())
        .bind(task.due_date())
        .bind(task.completed_at())
        .bind(task.assignee_id().map(|id| id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update task: {error}")))?;

        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete task: {error}")))?;

        Ok(())
    }

    async fn list_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
        filter: &TaskListFilter,
        page: TaskPage,
    ) -> AppResult<(Vec<Task>, u64)> {
        let ids: Vec<Uuid> = organization_ids.iter().map(OrganizationId::as_uuid).collect();
        let status = filter.status.map(|status| status.as_str().to_owned());
        let assignee_id = filter.assignee_id.map(|id| id.as_uuid());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE organization_id = ANY($1)
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::UUID IS NULL OR assignee_id = $3)
            "#,
        )
        .bind(&ids)
        .bind(status.as_deref())
        .bind(assignee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count tasks: {error}")))?;

        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            {SELECT_COLUMNS}
            WHERE organization_id = ANY($1)
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::UUID IS NULL OR assignee_id = $3)
            ORDER BY created_at DESC
            LIMIT $4
            OFFSET $5
            "#
        ))
        .bind(&ids)
        .bind(status.as_deref())
        .bind(assignee_id)
        .bind(page.page_size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tasks: {error}")))?;

        let tasks = rows
            .into_iter()
            .map(TaskRow::into_domain)
            .collect::<AppResult<Vec<Task>>>()?;

        Ok((tasks, total as u64))
    }

    async fn count_in_organization(&self, organization_id: OrganizationId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE organization_id = $1")
                .bind(organization_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to count tasks: {error}")))?;

        Ok(count as u64)
    }
}
