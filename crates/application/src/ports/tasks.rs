use std::collections::BTreeSet;

use async_trait::async_trait;
use taskhive_core::{AppResult, OrganizationId, TaskId, UserId};
use taskhive_domain::{Task, TaskStatus};

/// Filters applied to task listings before pagination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskListFilter {
    /// Keep only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Keep only tasks assigned to this user.
    pub assignee_id: Option<UserId>,
}

/// Offset pagination window, 1-based page numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPage {
    /// Page number starting at 1.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl Default for TaskPage {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl TaskPage {
    /// Returns the row offset for this window.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }
}

/// Repository port for task records.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task.
    async fn insert(&self, task: Task) -> AppResult<()>;

    /// Finds a task by identifier.
    async fn find(&self, task_id: TaskId) -> AppResult<Option<Task>>;

    /// Replaces an existing task record.
    async fn update(&self, task: Task) -> AppResult<()>;

    /// Removes a task record.
    async fn delete(&self, task_id: TaskId) -> AppResult<()>;

    /// Lists tasks inside the given organizations, newest first, returning
    /// the page and the total matching count.
    async fn list_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
        filter: &TaskListFilter,
        page: TaskPage,
    ) -> AppResult<(Vec<Task>, u64)>;

    /// Counts tasks belonging to one organization.
    async fn count_in_organization(&self, organization_id: OrganizationId) -> AppResult<u64>;
}
