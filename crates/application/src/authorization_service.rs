use std::sync::Arc;

use taskhive_core::{AppError, AppResult, OrganizationId, Principal, UserId};
use taskhive_domain::{AuditAction, PermissionAction, PermissionResource, RoleName};

use crate::AuditService;
use crate::ports::{
    AuditRecordInput, OrganizationRepository, RequestContext, RoleAssignmentRepository,
    UserRepository,
};

/// Outcome of one authorization check.
///
/// Services never act on a raw boolean: the audited `require_*` wrappers
/// forward this value to the audit recorder, so the coupling between a
/// decision and its audit entry lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the request is allowed.
    pub granted: bool,
    /// Human-readable denial reason, absent when granted.
    pub reason: Option<String>,
    /// Requested action.
    pub action: PermissionAction,
    /// Requested resource.
    pub resource: PermissionResource,
    /// Organization context the check ran in, when one was provided.
    pub organization_id: Option<OrganizationId>,
}

impl AccessDecision {
    fn granted(
        action: PermissionAction,
        resource: PermissionResource,
        organization_id: Option<OrganizationId>,
    ) -> Self {
        Self {
            granted: true,
            reason: None,
            action,
            resource,
            organization_id,
        }
    }

    fn denied(
        action: PermissionAction,
        resource: PermissionResource,
        organization_id: Option<OrganizationId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            granted: false,
            reason: Some(reason.into()),
            action,
            resource,
            organization_id,
        }
    }
}

/// The authorization engine: role permissions, role-hierarchy overrides,
/// and organization-hierarchy reachability.
///
/// Stateless between calls; every decision is derived from the current
/// repository state, so assignment changes are observable on the very next
/// check.
#[derive(Clone)]
pub struct AuthorizationService {
    users: Arc<dyn UserRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    audit: AuditService,
}

impl AuthorizationService {
    /// Creates an authorization service from repository implementations.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            assignments,
            organizations,
            audit,
        }
    }

    /// Evaluates whether a user may perform an action on a resource.
    ///
    /// An unknown principal and a principal without active assignments both
    /// collapse to a denial rather than an error, so the access-control path
    /// never leaks existence information. No audit side effect; use
    /// [`Self::require_permission`] at enforcement points.
    pub async fn check_permission(
        &self,
        user_id: UserId,
        action: PermissionAction,
        resource: PermissionResource,
        context: Option<OrganizationId>,
    ) -> AppResult<AccessDecision> {
        if self.users.find_user(user_id).await?.is_none() {
            return Ok(AccessDecision::denied(
                action,
                resource,
                context,
                "unknown principal",
            ));
        }

        let assignments = self.assignments.list_for_user(user_id).await?;
        let mut applicable = assignments
            .iter()
            .filter(|assignment| assignment.applies_in(context))
            .peekable();

        if applicable.peek().is_none() {
            return Ok(AccessDecision::denied(
                action,
                resource,
                context,
                "no active role assignments",
            ));
        }

        for assignment in applicable {
            let role = assignment.role();
            let explicit = role
                .default_permissions()
                .iter()
                .any(|permission| permission.grants(action, resource));

            if explicit || Self::role_hierarchy_grants(role, action, resource) {
                return Ok(AccessDecision::granted(action, resource, context));
            }
        }

        Ok(AccessDecision::denied(
            action,
            resource,
            context,
            format!(
                "no active role grants '{}:{}'",
                action.as_str(),
                resource.as_str()
            ),
        ))
    }

    /// Convenience projection of [`Self::check_permission`] to a verdict.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        action: PermissionAction,
        resource: PermissionResource,
        context: Option<OrganizationId>,
    ) -> AppResult<bool> {
        Ok(self
            .check_permission(user_id, action, resource, context)
            .await?
            .granted)
    }

    /// Role-hierarchy override, independent of explicit permission rows.
    ///
    /// Owner clears every check. Admin clears everything except blanket
    /// user management, which stays reserved for Owner. Viewer relies
    /// solely on explicit permissions.
    fn role_hierarchy_grants(
        role: RoleName,
        action: PermissionAction,
        resource: PermissionResource,
    ) -> bool {
        match role {
            RoleName::Owner => true,
            RoleName::Admin => {
                !(action == PermissionAction::Manage && resource == PermissionResource::User)
            }
            RoleName::Viewer => false,
        }
    }

    /// Evaluates organization-hierarchy reachability.
    ///
    /// A principal reaches its own organization and the direct children of
    /// its organization, nothing else: not siblings, and never upward from
    /// a child into its parent. Role is deliberately not considered here;
    /// call sites combine this with [`Self::check_permission`] as needed.
    pub async fn can_access_organization(
        &self,
        user_id: UserId,
        target_organization_id: OrganizationId,
    ) -> AppResult<bool> {
        let Some(user) = self.users.find_user(user_id).await? else {
            return Ok(false);
        };

        if user.organization_id() == target_organization_id {
            return Ok(true);
        }

        let Some(target) = self.organizations.find(target_organization_id).await? else {
            return Ok(false);
        };

        Ok(target.is_child_of(user.organization_id()))
    }

    /// Audited enforcement wrapper over [`Self::check_permission`].
    ///
    /// A denial appends exactly one `access_denied` record before the
    /// `Forbidden` error is surfaced; an allowed decision is returned for
    /// the gated operation to record its own outcome.
    pub async fn require_permission(
        &self,
        principal: &Principal,
        action: PermissionAction,
        resource: PermissionResource,
        context: Option<OrganizationId>,
        request: &RequestContext,
    ) -> AppResult<AccessDecision> {
        let decision = self
            .check_permission(principal.subject_id(), action, resource, context)
            .await?;

        if decision.granted {
            return Ok(decision);
        }

        let reason = decision
            .reason
            .clone()
            .unwrap_or_else(|| "permission denied".to_owned());

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::AccessDenied,
                resource: resource.as_str().to_owned(),
                resource_id: None,
                user_id: Some(principal.subject_id()),
                organization_id: context.unwrap_or_else(|| principal.organization_id()),
                details: Some(serde_json::json!({
                    "requested_action": action.as_str(),
                    "requested_resource": resource.as_str(),
                })),
                success: false,
                error_message: Some(reason.clone()),
                context: request.clone(),
            })
            .await?;

        Err(AppError::Forbidden(reason))
    }

    /// Audited enforcement wrapper over [`Self::can_access_organization`].
    pub async fn require_organization_access(
        &self,
        principal: &Principal,
        target_organization_id: OrganizationId,
        request: &RequestContext,
    ) -> AppResult<()> {
        if self
            .can_access_organization(principal.subject_id(), target_organization_id)
            .await?
        {
            return Ok(());
        }

        let reason = format!(
            "organization '{target_organization_id}' is not reachable from the principal's organization"
        );

        self.audit
            .record(AuditRecordInput {
                action: AuditAction::AccessDenied,
                resource: PermissionResource::Organization.as_str().to_owned(),
                resource_id: Some(target_organization_id.to_string()),
                user_id: Some(principal.subject_id()),
                organization_id: principal.organization_id(),
                details: None,
                success: false,
                error_message: Some(reason.clone()),
                context: request.clone(),
            })
            .await?;

        Err(AppError::Forbidden(reason))
    }
}
