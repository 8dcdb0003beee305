use std::collections::BTreeSet;

use async_trait::async_trait;
use taskhive_application::{TaskListFilter, TaskPage, TaskRepository};
use taskhive_core::{AppResult, OrganizationId, TaskId};
use taskhive_domain::Task;
use tokio::sync::RwLock;

/// In-memory task repository implementation.
///
/// Rows are held in insertion order; listings walk the vector backwards to
/// approximate the newest-first ordering of the SQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: Task) -> AppResult<()> {
        self.tasks.write().await.push(task);
        Ok(())
    }

    async fn find(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|task| task.id() == task_id)
            .cloned())
    }

    async fn update(&self, task: Task) -> AppResult<()> {
        let mut tasks = self.tasks.write().await;
        if let Some(stored) = tasks.iter_mut().find(|stored| stored.id() == task.id()) {
            *stored = task;
        }
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<()> {
        self.tasks.write().await.retain(|task| task.id() != task_id);
        Ok(())
    }

    async fn list_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
        filter: &TaskListFilter,
        page: TaskPage,
    ) -> AppResult<(Vec<Task>, u64)> {
        let tasks = self.tasks.read().await;
        let matching: Vec<Task> = tasks
            .iter()
            .rev()
            .filter(|task| organization_ids.contains(&task.organization_id()))
            .filter(|task| filter.status.is_none_or(|status| task.status() == status))
            .filter(|task| {
                filter
                    .assignee_id
                    .is_none_or(|assignee_id| task.assignee_id() == Some(assignee_id))
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let window = matching
            .into_iter()
            .skip(page.offset())
            .take(page.page_size)
            .collect();
        Ok((window, total))
    }

    async fn count_in_organization(&self, organization_id: OrganizationId) -> AppResult<u64> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|task| task.organization_id() == organization_id)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use taskhive_application::{TaskListFilter, TaskPage, TaskRepository};
    use taskhive_core::{OrganizationId, TaskId, UserId};
    use taskhive_domain::Task;

    use super::InMemoryTaskRepository;

    #[tokio::test]
    async fn listing_is_newest_first_with_totals() {
        let repository = InMemoryTaskRepository::new();
        let organization_id = OrganizationId::new();
        let author = UserId::new();

        for title in ["first", "second", "third"] {
            let task = Task::new(TaskId::new(), title, None, author, organization_id);
            assert!(task.is_ok());
            if let Ok(task) = task {
                assert!(repository.insert(task).await.is_ok());
            }
        }

        let page = repository
            .list_in_organizations(
                &BTreeSet::from([organization_id]),
                &TaskListFilter::default(),
                TaskPage {
                    page: 1,
                    page_size: 2,
                },
            )
            .await;
        let Ok((tasks, total)) = page else {
            return assert!(page.is_ok());
        };
        assert_eq!(total, 3);
        let titles: Vec<&str> = tasks.iter().map(|task| task.title().as_str()).collect();
        assert_eq!(titles, vec!["third", "second"]);
    }
}
