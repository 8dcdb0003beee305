use std::sync::Arc;

use taskhive_core::{AppError, AppResult, OrganizationId, Principal};
use taskhive_domain::{AuditAction, Organization, PermissionAction, PermissionResource};

use crate::ports::{
    AuditRecordInput, OrganizationRepository, RequestContext, TaskRepository, UserRepository,
};
use crate::{AuditService, AuthorizationService, ScopeService};

/// Input payload for creating organizations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganizationInput {
    /// Unique organization name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Parent organization for level-2 children.
    pub parent_id: Option<OrganizationId>,
}

/// Input payload for updating organizations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrganizationInput {
    /// Replacement name.
    pub name: String,
    /// Replacement description.
    pub description: Option<String>,
}

/// Application service for organization lifecycle and hierarchy invariants.
#[derive(Clone)]
pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    tasks: Arc<dyn TaskRepository>,
    authorization: AuthorizationService,
    scope: ScopeService,
    audit: AuditService,
}

impl OrganizationService {
    /// Creates an organization service from its collaborators.
    #[must_use]
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        tasks: Arc<dyn TaskRepository>,
        authorization: AuthorizationService,
        scope: ScopeService,
        audit: AuditService,
    ) -> Self {
        Self {
            organizations,
            users,
            tasks,
            authorization,
            scope,
            audit,
        }
    }

    /// Creates an organization, enforcing name uniqueness and the two-level
    /// depth cap before anything is persisted.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateOrganizationInput,
        request: &RequestContext,
    ) -> AppResult<Organization> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Create,
                PermissionResource::Organization,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        if self
            .organizations
            .find_by_name(input.name.trim())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "organization '{}' already exists",
                input.name.trim()
            )));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = self.organizations.find(parent_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("parent organization '{parent_id}' does not exist"))
            })?;

            // The depth cap is validated here, unconditionally, so chains
            // longer than two levels can never reach storage.
            if parent.parent_id().is_some() {
                return Err(AppError::Validation(
                    "organizations may only be nested two levels deep".to_owned(),
                ));
            }

            self.authorization
                .require_organization_access(principal, parent_id, request)
                .await?;
        }

        let organization = Organization::new(
            OrganizationId::new(),
            input.name.trim(),
            input.description,
            input.parent_id,
        )?;
        self.organizations.insert(organization.clone()).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Create,
                resource: PermissionResource::Organization.as_str().to_owned(),
                resource_id: Some(organization.id().to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: organization.id(),
                details: Some(serde_json::json!({
                    "name": organization.name().as_str(),
                    "parent_id": organization.parent_id().map(|id| id.to_string()),
                })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(organization)
    }

    /// Returns one organization reachable by the principal.
    pub async fn get(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        request: &RequestContext,
    ) -> AppResult<Organization> {
        let organization = self
            .organizations
            .find(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' does not exist"))
            })?;

        self.authorization
            .require_organization_access(principal, organization_id, request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::Organization,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        Ok(organization)
    }

    /// Lists the organizations inside the principal's visibility scope.
    pub async fn list(
        &self,
        principal: &Principal,
        request: &RequestContext,
    ) -> AppResult<Vec<Organization>> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::Organization,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let accessible = self
            .scope
            .accessible_organizations(principal.subject_id())
            .await?;

        self.organizations.list_by_ids(&accessible).await
    }

    /// Renames an organization, preserving name uniqueness.
    pub async fn update(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        input: UpdateOrganizationInput,
        request: &RequestContext,
    ) -> AppResult<Organization> {
        let mut organization = self
            .organizations
            .find(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' does not exist"))
            })?;

        self.authorization
            .require_organization_access(principal, organization_id, request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Update,
                PermissionResource::Organization,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let new_name = input.name.trim();
        if new_name != organization.name().as_str() {
            if let Some(existing) = self.organizations.find_by_name(new_name).await? {
                if existing.id() != organization_id {
                    return Err(AppError::Conflict(format!(
                        "organization '{new_name}' already exists"
                    )));
                }
            }
        }

        organization.rename(new_name, input.description)?;
        self.organizations.update(organization.clone()).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Update,
                resource: PermissionResource::Organization.as_str().to_owned(),
                resource_id: Some(organization_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id,
                details: Some(serde_json::json!({ "name": organization.name().as_str() })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(organization)
    }

    /// Deletes an organization once nothing references it.
    ///
    /// The referential guard runs before the delete: an organization with
    /// users, child organizations, or tasks is left untouched and the call
    /// fails with `Conflict`.
    pub async fn delete(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        request: &RequestContext,
    ) -> AppResult<()> {
        if self.organizations.find(organization_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "organization '{organization_id}' does not exist"
            )));
        }

        self.authorization
            .require_organization_access(principal, organization_id, request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Delete,
                PermissionResource::Organization,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        if self
            .users
            .count_users_in_organization(organization_id)
            .await?
            > 0
        {
            return Err(AppError::Conflict(
                "cannot delete organization with existing users".to_owned(),
            ));
        }

        if !self
            .organizations
            .list_children(organization_id)
            .await?
            .is_empty()
        {
            return Err(AppError::Conflict(
                "cannot delete organization with child organizations".to_owned(),
            ));
        }

        if self.tasks.count_in_organization(organization_id).await? > 0 {
            return Err(AppError::Conflict(
                "cannot delete organization with existing tasks".to_owned(),
            ));
        }

        self.organizations.delete(organization_id).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Delete,
                resource: PermissionResource::Organization.as_str().to_owned(),
                resource_id: Some(organization_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: principal.organization_id(),
                details: None,
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use taskhive_core::{AppError, TaskId};
    use taskhive_domain::{RoleName, Task};

    use crate::test_support::{TestWorld, principal_for};

    use super::{CreateOrganizationInput, UpdateOrganizationInput};

    #[tokio::test]
    async fn owner_creates_a_child_organization() {
        let world = TestWorld::new();
        let parent = world.add_organization("Acme", None).await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let principal = principal_for(&owner);

        let created = world
            .organization_service
            .create(
                &principal,
                CreateOrganizationInput {
                    name: "Acme-Eng".to_owned(),
                    description: None,
                    parent_id: Some(parent),
                },
                &Default::default(),
            )
            .await;

        let Ok(child) = created else {
            return assert!(created.is_ok());
        };
        assert_eq!(child.level(), 2);
        assert_eq!(world.hierarchy.level(child.id()).await.ok(), Some(2));

        // One success row for the creation itself.
        let rows = world.audit_log.all().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].success);
    }

    #[tokio::test]
    async fn third_level_nesting_is_rejected_before_persisting() {
        let world = TestWorld::new();
        let (parent, child) = world.add_parent_and_child("Acme", "Acme-Eng").await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let principal = principal_for(&owner);

        let result = world
            .organization_service
            .create(
                &principal,
                CreateOrganizationInput {
                    name: "Acme-Eng-Platform".to_owned(),
                    description: None,
                    parent_id: Some(child),
                },
                &Default::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(
            world
                .organizations
                .get_by_name("Acme-Eng-Platform")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let world = TestWorld::new();
        let parent = world.add_organization("Acme", None).await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let principal = principal_for(&owner);

        let result = world
            .organization_service
            .create(
                &principal,
                CreateOrganizationInput {
                    name: "Acme".to_owned(),
                    description: None,
                    parent_id: None,
                },
                &Default::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn delete_guards_against_users_children_and_tasks() {
        let world = TestWorld::new();
        let parent = world.add_organization("Acme", None).await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let principal = principal_for(&owner);

        // Organization with a child cannot be deleted.
        let child = world.add_child(parent, "Acme-Eng").await;
        let with_child = world
            .organization_service
            .delete(&principal, parent, &Default::default())
            .await;
        assert!(matches!(with_child, Err(AppError::Conflict(_))));

        // Child with a task cannot be deleted.
        let task = Task::new(TaskId::new(), "Backlog triage", None, owner.id(), child);
        assert!(task.is_ok());
        if let Ok(task) = task {
            world.tasks.put(task.clone()).await;
            let with_task = world
                .organization_service
                .delete(&principal, child, &Default::default())
                .await;
            assert!(matches!(with_task, Err(AppError::Conflict(_))));
            world.tasks.remove(task.id()).await;
        }

        // Empty child deletes cleanly.
        let emptied = world
            .organization_service
            .delete(&principal, child, &Default::default())
            .await;
        assert!(emptied.is_ok());
        assert!(world.organizations.get(child).await.is_none());

        // Organization with users cannot be deleted.
        let with_users = world
            .organization_service
            .delete(&principal, parent, &Default::default())
            .await;
        assert!(matches!(with_users, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn rename_preserves_uniqueness() {
        let world = TestWorld::new();
        let parent = world.add_organization("Acme", None).await;
        world.add_organization("Globex", None).await;
        let owner = world
            .add_user_with_role(parent, "owner@acme.example", RoleName::Owner)
            .await;
        let principal = principal_for(&owner);

        let clash = world
            .organization_service
            .update(
                &principal,
                parent,
                UpdateOrganizationInput {
                    name: "Globex".to_owned(),
                    description: None,
                },
                &Default::default(),
            )
            .await;
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        let renamed = world
            .organization_service
            .update(
                &principal,
                parent,
                UpdateOrganizationInput {
                    name: "Acme Industries".to_owned(),
                    description: Some("renamed".to_owned()),
                },
                &Default::default(),
            )
            .await;
        assert!(renamed.is_ok());
    }

    #[tokio::test]
    async fn viewer_cannot_create_organizations() {
        let world = TestWorld::new();
        let parent = world.add_organization("Acme", None).await;
        let viewer = world
            .add_user_with_role(parent, "viewer@acme.example", RoleName::Viewer)
            .await;
        let principal = principal_for(&viewer);

        let result = world
            .organization_service
            .create(
                &principal,
                CreateOrganizationInput {
                    name: "Shadow Org".to_owned(),
                    description: None,
                    parent_id: None,
                },
                &Default::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(world.audit_log.len().await, 1);
    }
}
