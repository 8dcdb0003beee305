use async_trait::async_trait;
use taskhive_core::{AppResult, OrganizationId, UserId};
use taskhive_domain::{RoleAssignment, RoleName};

/// Repository port for role assignments.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Lists every assignment held by a user, active or not.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Persists a new assignment.
    async fn insert(&self, assignment: RoleAssignment) -> AppResult<()>;

    /// Deactivates assignments matching the user, role, and scope.
    async fn deactivate(
        &self,
        user_id: UserId,
        role: RoleName,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()>;

    /// Deactivates every assignment held by a user.
    async fn deactivate_all_for_user(&self, user_id: UserId) -> AppResult<()>;
}
