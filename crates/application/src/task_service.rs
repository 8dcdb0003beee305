use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskhive_core::{AppError, AppResult, Principal, TaskId, UserId};
use taskhive_domain::{
    AuditAction, PermissionAction, PermissionResource, Task, TaskCategory, TaskPriority,
    TaskStatus,
};

use crate::ports::{
    AuditRecordInput, RequestContext, TaskListFilter, TaskPage, TaskRepository, UserRepository,
};
use crate::{AuditService, AuthorizationService, ScopeService};

/// Input payload for creating tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateTaskInput {
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Priority, defaulting to medium.
    pub priority: Option<TaskPriority>,
    /// Category, defaulting to work.
    pub category: Option<TaskCategory>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional assignee; must be reachable through the organization
    /// hierarchy.
    pub assignee_id: Option<UserId>,
}

/// Input payload for updating tasks; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateTaskInput {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement workflow status.
    pub status: Option<TaskStatus>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Replacement category.
    pub category: Option<TaskCategory>,
    /// Replacement due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Replacement assignee.
    pub assignee_id: Option<UserId>,
}

/// Application service for task CRUD under the authorization core.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    authorization: AuthorizationService,
    scope: ScopeService,
    audit: AuditService,
}

impl TaskService {
    /// Creates a task service from its collaborators.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        authorization: AuthorizationService,
        scope: ScopeService,
        audit: AuditService,
    ) -> Self {
        Self {
            tasks,
            users,
            authorization,
            scope,
            audit,
        }
    }

    /// Creates a task in the principal's organization.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateTaskInput,
        request: &RequestContext,
    ) -> AppResult<Task> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Create,
                PermissionResource::Task,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        if let Some(assignee_id) = input.assignee_id {
            self.require_reachable_assignee(principal, assignee_id, request)
                .await?;
        }

        let mut task = Task::new(
            TaskId::new(),
            input.title,
            input.description,
            principal.subject_id(),
            principal.organization_id(),
        )?;
        if let Some(priority) = input.priority {
            task.set_priority(priority);
        }
        if let Some(category) = input.category {
            task.set_category(category);
        }
        task.set_due_date(input.due_date);
        task.set_assignee(input.assignee_id);

        self.tasks.insert(task.clone()).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Create,
                resource: PermissionResource::Task.as_str().to_owned(),
                resource_id: Some(task.id().to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: task.organization_id(),
                details: Some(serde_json::json!({
                    "title": task.title().as_str(),
                    "assignee_id": task.assignee_id().map(|id| id.to_string()),
                })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(task)
    }

    /// Returns one task, enforcing hierarchy reachability before the
    /// permission check.
    pub async fn get(
        &self,
        principal: &Principal,
        task_id: TaskId,
        request: &RequestContext,
    ) -> AppResult<Task> {
        let task = self
            .tasks
            .find(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task '{task_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, task.organization_id(), request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::Task,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Read,
                resource: PermissionResource::Task.as_str().to_owned(),
                resource_id: Some(task_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: task.organization_id(),
                details: None,
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(task)
    }

    /// Lists tasks inside the principal's visibility scope, newest first.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: TaskListFilter,
        page: TaskPage,
        request: &RequestContext,
    ) -> AppResult<(Vec<Task>, u64)> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::Task,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let accessible = self
            .scope
            .accessible_organizations(principal.subject_id())
            .await?;
        let (tasks, total) = self
            .tasks
            .list_in_organizations(&accessible, &filter, page)
            .await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Read,
                resource: PermissionResource::Task.as_str().to_owned(),
                resource_id: None,
                user_id: Some(principal.subject_id()),
                organization_id: principal.organization_id(),
                details: Some(serde_json::json!({ "count": tasks.len(), "total": total })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok((tasks, total))
    }

    /// Updates a task, revalidating assignee reachability when it changes.
    pub async fn update(
        &self,
        principal: &Principal,
        task_id: TaskId,
        input: UpdateTaskInput,
        request: &RequestContext,
    ) -> AppResult<Task> {
        let mut task = self
            .tasks
            .find(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task '{task_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, task.organization_id(), request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Update,
                PermissionResource::Task,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        if let Some(assignee_id) = input.assignee_id {
            if task.assignee_id() != Some(assignee_id) {
                self.require_reachable_assignee(principal, assignee_id, request)
                    .await?;
            }
            task.set_assignee(Some(assignee_id));
        }

        if let Some(title) = input.title {
            task.set_title(title)?;
        }
        if let Some(description) = input.description {
            task.set_description(Some(description));
        }
        if let Some(priority) = input.priority {
            task.set_priority(priority);
        }
        if let Some(category) = input.category {
            task.set_category(category);
        }
        if let Some(due_date) = input.due_date {
            task.set_due_date(Some(due_date));
        }
        if let Some(status) = input.status {
            task.transition(status, Utc::now());
        }

        self.tasks.update(task.clone()).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Update,
                resource: PermissionResource::Task.as_str().to_owned(),
                resource_id: Some(task_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: task.organization_id(),
                details: Some(serde_json::json!({ "status": task.status().as_str() })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(task)
    }

    /// Deletes a task.
    pub async fn delete(
        &self,
        principal: &Principal,
        task_id: TaskId,
        request: &RequestContext,
    ) -> AppResult<()> {
        let task = self
            .tasks
            .find(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task '{task_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, task.organization_id(), request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Delete,
                PermissionResource::Task,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        self.tasks.delete(task_id).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Delete,
                resource: PermissionResource::Task.as_str().to_owned(),
                resource_id: Some(task_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: task.organization_id(),
                details: None,
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(())
    }

    /// Validates that a task assignee exists and sits in an organization
    /// the principal can reach. Reachability alone decides here; the
    /// permission check already ran.
    async fn require_reachable_assignee(
        &self,
        principal: &Principal,
        assignee_id: UserId,
        request: &RequestContext,
    ) -> AppResult<()> {
        let assignee = self
            .users
            .find_user(assignee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("assignee '{assignee_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, assignee.organization_id(), request)
            .await
            .map_err(|error| match error {
                AppError::Forbidden(_) => AppError::Forbidden(
                    "cannot assign task to a user from an unreachable organization".to_owned(),
                ),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use taskhive_core::{AppError, TaskId};
    use taskhive_domain::{AuditAction, RoleName, TaskStatus};

    use crate::ports::{TaskListFilter, TaskPage};
    use crate::test_support::{TestWorld, principal_for};

    use super::{CreateTaskInput, UpdateTaskInput};

    #[tokio::test]
    async fn owner_reads_a_child_org_task_with_one_success_row() {
        let world = TestWorld::new();
        let (parent, child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let engineer = world
            .add_user_with_role(child, "eng@acme.example", RoleName::Viewer)
            .await;
        let engineer_principal = principal_for(&engineer);

        let created = world
            .task_service
            .create(
                &engineer_principal,
                CreateTaskInput {
                    title: "Wire up telemetry".to_owned(),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(task) = created else {
            return assert!(created.is_ok());
        };

        world.audit_log.clear().await;

        let fetched = world
            .task_service
            .get(&principal_for(&owner), task.id(), &Default::default())
            .await;
        assert!(fetched.is_ok());

        let rows = world.audit_log.all().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].success);
        assert_eq!(rows[0].action, AuditAction::Read);
    }

    #[tokio::test]
    async fn child_admin_is_denied_parent_task_before_permission_runs() {
        let world = TestWorld::new();
        let (parent, child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let parent_owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let child_admin = world
            .add_user_with_role(child, "admin@eng.example", RoleName::Admin)
            .await;

        let created = world
            .task_service
            .create(
                &principal_for(&parent_owner),
                CreateTaskInput {
                    title: "Quarterly planning".to_owned(),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(task) = created else {
            return assert!(created.is_ok());
        };

        world.audit_log.clear().await;

        let denied = world
            .task_service
            .get(&principal_for(&child_admin), task.id(), &Default::default())
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let rows = world.audit_log.all().await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].success);
        assert_eq!(rows[0].action, AuditAction::AccessDenied);
        assert!(rows[0].error_message.is_some());
    }

    #[tokio::test]
    async fn listing_is_scoped_to_accessible_organizations() {
        let world = TestWorld::new();
        let (parent, child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let admin = world
            .add_user_with_role(parent, "admin@acme.example", RoleName::Admin)
            .await;
        let engineer = world
            .add_user_with_role(child, "eng@acme.example", RoleName::Admin)
            .await;

        for (creator, title) in [
            (&owner, "Parent task"),
            (&engineer, "Child task"),
        ] {
            let created = world
                .task_service
                .create(
                    &principal_for(creator),
                    CreateTaskInput {
                        title: (*title).to_owned(),
                        ..Default::default()
                    },
                    &Default::default(),
                )
                .await;
            assert!(created.is_ok());
        }

        let owner_view = world
            .task_service
            .list(
                &principal_for(&owner),
                TaskListFilter::default(),
                TaskPage::default(),
                &Default::default(),
            )
            .await;
        let Ok((_, owner_total)) = owner_view else {
            return assert!(owner_view.is_ok());
        };
        assert_eq!(owner_total, 2);

        let admin_view = world
            .task_service
            .list(
                &principal_for(&admin),
                TaskListFilter::default(),
                TaskPage::default(),
                &Default::default(),
            )
            .await;
        let Ok((_, admin_total)) = admin_view else {
            return assert!(admin_view.is_ok());
        };
        assert_eq!(admin_total, 1);
    }

    #[tokio::test]
    async fn cross_org_assignee_is_rejected() {
        let world = TestWorld::new();
        let (parent, _child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let unrelated = world.add_organization("Globex", None).await;
        let admin = world
            .add_user_with_role(parent, "admin@acme.example", RoleName::Admin)
            .await;
        let outsider = world
            .add_user_with_role(unrelated, "stranger@globex.example", RoleName::Viewer)
            .await;

        let result = world
            .task_service
            .create(
                &principal_for(&admin),
                CreateTaskInput {
                    title: "Cross-org handoff".to_owned(),
                    assignee_id: Some(outsider.id()),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn owner_assigns_into_a_child_organization() {
        let world = TestWorld::new();
        let (parent, child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let engineer = world
            .add_user_with_role(child, "eng@acme.example", RoleName::Viewer)
            .await;

        let result = world
            .task_service
            .create(
                &principal_for(&owner),
                CreateTaskInput {
                    title: "Delegated work".to_owned(),
                    assignee_id: Some(engineer.id()),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn completion_timestamp_is_maintained_on_update() {
        let world = TestWorld::new();
        let organization_id = world.add_organization("Acme", None).await;
        let admin = world
            .add_user_with_role(organization_id, "admin@acme.example", RoleName::Admin)
            .await;
        let principal = principal_for(&admin);

        let created = world
            .task_service
            .create(
                &principal,
                CreateTaskInput {
                    title: "Close the books".to_owned(),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(task) = created else {
            return assert!(created.is_ok());
        };

        let updated = world
            .task_service
            .update(
                &principal,
                task.id(),
                UpdateTaskInput {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(done) = updated else {
            return assert!(updated.is_ok());
        };
        assert!(done.completed_at().is_some());

        let reopened = world
            .task_service
            .update(
                &principal,
                task.id(),
                UpdateTaskInput {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(reopened) = reopened else {
            return assert!(reopened.is_ok());
        };
        assert!(reopened.completed_at().is_none());
    }

    #[tokio::test]
    async fn viewer_cannot_delete_and_the_denial_is_audited_once() {
        let world = TestWorld::new();
        let organization_id = world.add_organization("Acme", None).await;
        let admin = world
            .add_user_with_role(organization_id, "admin@acme.example", RoleName::Admin)
            .await;
        let viewer = world
            .add_user_with_role(organization_id, "viewer@acme.example", RoleName::Viewer)
            .await;

        let created = world
            .task_service
            .create(
                &principal_for(&admin),
                CreateTaskInput {
                    title: "Protected task".to_owned(),
                    ..Default::default()
                },
                &Default::default(),
            )
            .await;
        let Ok(task) = created else {
            return assert!(created.is_ok());
        };

        world.audit_log.clear().await;

        let denied = world
            .task_service
            .delete(&principal_for(&viewer), task.id(), &Default::default())
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        assert_eq!(world.audit_log.len().await, 1);

        let missing = world
            .task_service
            .delete(&principal_for(&admin), TaskId::new(), &Default::default())
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
