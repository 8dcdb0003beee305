use std::str::FromStr;
use std::sync::Arc;

use taskhive_core::{AppError, AppResult, OrganizationId, Principal, RoleAssignmentId, UserId};
use taskhive_domain::{
    AuditAction, PermissionAction, PermissionResource, RoleAssignment, RoleName, User, UserStatus,
};

use crate::ports::{
    AuditRecordInput, RequestContext, RoleAssignmentRepository, UserRepository,
};
use crate::{AuditService, AuthorizationService, ScopeService};

/// Application service for the user directory and role administration.
///
/// Role administration is gated on `manage:user`, which the role-hierarchy
/// override reserves for Owner.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    authorization: AuthorizationService,
    scope: ScopeService,
    audit: AuditService,
}

impl UserService {
    /// Creates a user service from its collaborators.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        authorization: AuthorizationService,
        scope: ScopeService,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            assignments,
            authorization,
            scope,
            audit,
        }
    }

    /// Lists users inside the principal's visibility scope.
    pub async fn list(
        &self,
        principal: &Principal,
        request: &RequestContext,
    ) -> AppResult<Vec<User>> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::User,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let accessible = self
            .scope
            .accessible_organizations(principal.subject_id())
            .await?;

        self.users.list_users_in_organizations(&accessible).await
    }

    /// Returns one user reachable by the principal.
    pub async fn get(
        &self,
        principal: &Principal,
        user_id: UserId,
        request: &RequestContext,
    ) -> AppResult<User> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, user.organization_id(), request)
            .await?;
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Read,
                PermissionResource::User,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        Ok(user)
    }

    /// Grants a role to a user, optionally scoped to one organization.
    ///
    /// Granting an already-active identical assignment is idempotent. The
    /// role name arrives as the caller provided it; an unknown name is a
    /// conflict, not a validation slip, to distinguish it from malformed
    /// payloads upstream.
    pub async fn assign_role(
        &self,
        principal: &Principal,
        user_id: UserId,
        role_name: &str,
        organization_id: Option<OrganizationId>,
        request: &RequestContext,
    ) -> AppResult<RoleAssignment> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Manage,
                PermissionResource::User,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let role = RoleName::from_str(role_name)
            .map_err(|_| AppError::Conflict(format!("unknown role '{role_name}'")))?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, user.organization_id(), request)
            .await?;

        if let Some(scope_organization_id) = organization_id {
            self.authorization
                .require_organization_access(principal, scope_organization_id, request)
                .await?;
        }

        let existing = self
            .assignments
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|assignment| {
                assignment.is_active()
                    && assignment.role() == role
                    && assignment.organization_id() == organization_id
            });

        if let Some(assignment) = existing {
            return Ok(assignment);
        }

        let assignment =
            RoleAssignment::new(RoleAssignmentId::new(), user_id, role, organization_id);
        self.assignments.insert(assignment.clone()).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Update,
                resource: PermissionResource::User.as_str().to_owned(),
                resource_id: Some(user_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: user.organization_id(),
                details: Some(serde_json::json!({
                    "assigned_role": role.as_str(),
                    "scope": organization_id.map(|id| id.to_string()),
                })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(assignment)
    }

    /// Deactivates matching role assignments; the grant disappears on the
    /// next permission check.
    pub async fn revoke_role(
        &self,
        principal: &Principal,
        user_id: UserId,
        role_name: &str,
        organization_id: Option<OrganizationId>,
        request: &RequestContext,
    ) -> AppResult<()> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Manage,
                PermissionResource::User,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let role = RoleName::from_str(role_name)
            .map_err(|_| AppError::Conflict(format!("unknown role '{role_name}'")))?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        self.assignments
            .deactivate(user_id, role, organization_id)
            .await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Update,
                resource: PermissionResource::User.as_str().to_owned(),
                resource_id: Some(user_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: user.organization_id(),
                details: Some(serde_json::json!({ "revoked_role": role.as_str() })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(())
    }

    /// Deactivates a user and every role assignment it holds.
    pub async fn deactivate(
        &self,
        principal: &Principal,
        user_id: UserId,
        request: &RequestContext,
    ) -> AppResult<()> {
        self.authorization
            .require_permission(
                principal,
                PermissionAction::Manage,
                PermissionResource::User,
                Some(principal.organization_id()),
                request,
            )
            .await?;

        let mut user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        self.authorization
            .require_organization_access(principal, user.organization_id(), request)
            .await?;

        user.set_status(UserStatus::Inactive);
        self.users.update_user(user.clone()).await?;
        self.assignments.deactivate_all_for_user(user_id).await?;

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::Update,
                resource: PermissionResource::User.as_str().to_owned(),
                resource_id: Some(user_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: user.organization_id(),
                details: Some(serde_json::json!({ "status": UserStatus::Inactive.as_str() })),
                success: true,
                error_message: None,
                context: request.clone(),
            })
            .await?;

        Ok(())
    }
}
