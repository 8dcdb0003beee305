//! In-memory fakes and a wired service world shared by the service tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use taskhive_core::{AppResult, OrganizationId, Principal, TaskId, UserId};
use taskhive_domain::{
    EmailAddress, Organization, RoleAssignment, RoleName, Task, User,
};

use crate::ports::{
    AuditLogRepository, AuditQuery, AuditRecord, OrganizationRepository,
    RoleAssignmentRepository, TaskListFilter, TaskPage, TaskRepository, UserRepository,
};
use crate::{
    AuditService, AuthorizationService, OrganizationHierarchy, OrganizationService, ScopeService,
    TaskService, UserService,
};

/// Builds a user fixture; panics only on an invalid fixture email.
pub fn sample_user(organization_id: OrganizationId, email: &str) -> User {
    match User::new(UserId::new(), email, "Test", "User", organization_id) {
        Ok(user) => user,
        Err(error) => panic!("invalid fixture user '{email}': {error}"),
    }
}

/// Builds a half-hour principal for a stored user.
pub fn principal_for(user: &User) -> Principal {
    let issued_at = Utc::now();
    Principal::new(
        user.id(),
        user.organization_id(),
        Vec::new(),
        issued_at,
        issued_at + Duration::minutes(30),
    )
}

#[derive(Default)]
pub struct FakeUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl FakeUserRepository {
    pub async fn put(&self, user: User) {
        self.users.lock().await.insert(user.id(), user);
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        self.users.lock().await.insert(user.id(), user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> AppResult<()> {
        self.users.lock().await.insert(user.id(), user);
        Ok(())
    }

    async fn list_users_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<User>> {
        let mut listed: Vec<User> = self
            .users
            .lock()
            .await
            .values()
            .filter(|user| organization_ids.contains(&user.organization_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.email().as_str().cmp(right.email().as_str()));
        Ok(listed)
    }

    async fn count_users_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<u64> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .filter(|user| user.organization_id() == organization_id)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct FakeRoleAssignmentRepository {
    assignments: Mutex<Vec<RoleAssignment>>,
}

impl FakeRoleAssignmentRepository {
    pub async fn put(&self, assignment: RoleAssignment) {
        self.assignments.lock().await.push(assignment);
    }

    pub async fn deactivate_role(&self, user_id: UserId, role: RoleName) {
        for assignment in self.assignments.lock().await.iter_mut() {
            if assignment.user_id() == user_id && assignment.role() == role {
                assignment.deactivate();
            }
        }
    }

    pub async fn count_for_user(&self, user_id: UserId) -> usize {
        self.assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id() == user_id)
            .count()
    }
}

#[async_trait]
impl RoleAssignmentRepository for FakeRoleAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.assignments.lock().await.push(assignment);
        Ok(())
    }

    async fn deactivate(
        &self,
        user_id: UserId,
        role: RoleName,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        for assignment in self.assignments.lock().await.iter_mut() {
            let scope_matches =
                organization_id.is_none() || assignment.organization_id() == organization_id;
            if assignment.user_id() == user_id && assignment.role() == role && scope_matches {
                assignment.deactivate();
            }
        }
        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: UserId) -> AppResult<()> {
        for assignment in self.assignments.lock().await.iter_mut() {
            if assignment.user_id() == user_id {
                assignment.deactivate();
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeOrganizationRepository {
    organizations: Mutex<HashMap<OrganizationId, Organization>>,
}

impl FakeOrganizationRepository {
    pub async fn get(&self, organization_id: OrganizationId) -> Option<Organization> {
        self.organizations.lock().await.get(&organization_id).cloned()
    }

    pub async fn get_by_name(&self, name: &str) -> Option<Organization> {
        self.organizations
            .lock()
            .await
            .values()
            .find(|organization| organization.name().as_str() == name)
            .cloned()
    }
}

#[async_trait]
impl OrganizationRepository for FakeOrganizationRepository {
    async fn find(&self, organization_id: OrganizationId) -> AppResult<Option<Organization>> {
        Ok(self.organizations.lock().await.get(&organization_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        Ok(self.get_by_name(name).await)
    }

    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        let mut children: Vec<Organization> = self
            .organizations
            .lock()
            .await
            .values()
            .filter(|organization| organization.is_child_of(parent_id))
            .cloned()
            .collect();
        children.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(children)
    }

    async fn list_by_ids(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<Organization>> {
        let mut listed: Vec<Organization> = self
            .organizations
            .lock()
            .await
            .values()
            .filter(|organization| organization_ids.contains(&organization.id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn insert(&self, organization: Organization) -> AppResult<()> {
        self.organizations
            .lock()
            .await
            .insert(organization.id(), organization);
        Ok(())
    }

    async fn update(&self, organization: Organization) -> AppResult<()> {
        self.organizations
            .lock()
            .await
            .insert(organization.id(), organization);
        Ok(())
    }

    async fn delete(&self, organization_id: OrganizationId) -> AppResult<()> {
        self.organizations.lock().await.remove(&organization_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl FakeTaskRepository {
    pub async fn put(&self, task: Task) {
        self.tasks.lock().await.push(task);
    }

    pub async fn remove(&self, task_id: TaskId) {
        self.tasks.lock().await.retain(|task| task.id() != task_id);
    }
}

#[async_trait]
impl TaskRepository for FakeTaskRepository {
    async fn insert(&self, task: Task) -> AppResult<()> {
        self.tasks.lock().await.push(task);
        Ok(())
    }

    async fn find(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        Ok(self
            .tasks
            .lock()
            .await
            .iter()
            .find(|task| task.id() == task_id)
            .cloned())
    }

    async fn update(&self, task: Task) -> AppResult<()> {
        let mut tasks = self.tasks.lock().await;
        if let Some(stored) = tasks.iter_mut().find(|stored| stored.id() == task.id()) {
            *stored = task;
        }
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<()> {
        self.tasks.lock().await.retain(|task| task.id() != task_id);
        Ok(())
    }

    async fn list_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
        filter: &TaskListFilter,
        page: TaskPage,
    ) -> AppResult<(Vec<Task>, u64)> {
        let matching: Vec<Task> = self
            .tasks
            .lock()
            .await
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
            .lock()
            .await
            .iter()
            .filter(|task| task.organization_id() == organization_id)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct FakeAuditLogRepository {
    records: Mutex<Vec<AuditRecord>>,
}

impl FakeAuditLogRepository {
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn all(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.records.lock().await.clear();
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditLogRepository {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn query(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<AuditRecord>, u64)> {
        let matching: Vec<AuditRecord> = self
            .records
            .lock()
            .await
            .iter()
            .rev()
            .filter(|record| record.organization_id == organization_id)
            .filter(|record| {
                query
                    .actor_id
                    .is_none_or(|actor_id| record.user_id == Some(actor_id))
            })
            .filter(|record| {
                query
                    .resource
                    .as_deref()
                    .is_none_or(|resource| record.resource == resource)
            })
            .filter(|record| query.action.is_none_or(|action| record.action == action))
            .filter(|record| query.from.is_none_or(|from| record.created_at >= from))
            .filter(|record| query.to.is_none_or(|to| record.created_at <= to))
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let window = matching.into_iter().skip(offset).take(limit).collect();
        Ok((window, total))
    }
}

/// Fully wired in-memory service graph used across the service tests.
pub struct TestWorld {
    pub users: Arc<FakeUserRepository>,
    pub assignments: Arc<FakeRoleAssignmentRepository>,
    pub organizations: Arc<FakeOrganizationRepository>,
    pub tasks: Arc<FakeTaskRepository>,
    pub audit_log: Arc<FakeAuditLogRepository>,
    pub authorization: AuthorizationService,
    pub hierarchy: OrganizationHierarchy,
    pub scope: ScopeService,
    pub organization_service: OrganizationService,
    pub task_service: TaskService,
    pub user_service: UserService,
}

impl TestWorld {
    pub fn new() -> Self {
        let users = Arc::new(FakeUserRepository::default());
        let assignments = Arc::new(FakeRoleAssignmentRepository::default());
        let organizations = Arc::new(FakeOrganizationRepository::default());
        let tasks = Arc::new(FakeTaskRepository::default());
        let audit_log = Arc::new(FakeAuditLogRepository::default());

        let users_port: Arc<dyn UserRepository> = users.clone();
        let assignments_port: Arc<dyn RoleAssignmentRepository> = assignments.clone();
        let organizations_port: Arc<dyn OrganizationRepository> = organizations.clone();
        let tasks_port: Arc<dyn TaskRepository> = tasks.clone();
        let audit_log_port: Arc<dyn AuditLogRepository> = audit_log.clone();

        let audit = AuditService::new(audit_log_port, users_port.clone());
        let authorization = AuthorizationService::new(
            users_port.clone(),
            assignments_port.clone(),
            organizations_port.clone(),
            audit.clone(),
        );
        let hierarchy = OrganizationHierarchy::new(organizations_port.clone());
        let scope = ScopeService::new(
            users_port.clone(),
            assignments_port.clone(),
            hierarchy.clone(),
        );
        let organization_service = OrganizationService::new(
            organizations_port.clone(),
            users_port.clone(),
            tasks_port.clone(),
            authorization.clone(),
            scope.clone(),
            audit.clone(),
        );
        let task_service = TaskService::new(
            tasks_port,
            users_port.clone(),
            authorization.clone(),
            scope.clone(),
            audit.clone(),
        );
        let user_service = UserService::new(
            users_port,
            assignments_port,
            authorization.clone(),
            scope.clone(),
            audit.clone(),
        );

        Self {
            users,
            assignments,
            organizations,
            tasks,
            audit_log,
            authorization,
            hierarchy,
            scope,
            organization_service,
            task_service,
            user_service,
        }
    }

    pub fn users_port(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    pub fn assignments_port(&self) -> Arc<dyn RoleAssignmentRepository> {
        self.assignments.clone()
    }

    pub fn organizations_port(&self) -> Arc<dyn OrganizationRepository> {
        self.organizations.clone()
    }

    /// Stores an organization and returns its identifier; panics only on an
    /// invalid fixture name.
    pub async fn add_organization(
        &self,
        name: &str,
        parent_id: Option<OrganizationId>,
    ) -> OrganizationId {
        let organization = match Organization::new(OrganizationId::new(), name, None, parent_id) {
            Ok(organization) => organization,
            Err(error) => panic!("invalid fixture organization '{name}': {error}"),
        };
        let organization_id = organization.id();
        self.organizations
            .organizations
            .lock()
            .await
            .insert(organization_id, organization);
        organization_id
    }

    /// Stores a child under an existing parent.
    pub async fn add_child(&self, parent_id: OrganizationId, name: &str) -> OrganizationId {
        self.add_organization(name, Some(parent_id)).await
    }

    /// Stores a parent organization with one child.
    pub async fn add_parent_and_child(
        &self,
        parent_name: &str,
        child_name: &str,
    ) -> (OrganizationId, OrganizationId) {
        let parent_id = self.add_organization(parent_name, None).await;
        let child_id = self.add_child(parent_id, child_name).await;
        (parent_id, child_id)
    }

    /// Stores a user with an active assignment scoped to the organization.
    pub async fn add_user_with_role(
        &self,
        organization_id: OrganizationId,
        email: &str,
        role: RoleName,
    ) -> User {
        let user = sample_user(organization_id, email);
        self.users.put(user.clone()).await;
        self.assignments
            .put(RoleAssignment::new(
                taskhive_core::RoleAssignmentId::new(),
                user.id(),
                role,
                Some(organization_id),
            ))
            .await;
        user
    }
}
