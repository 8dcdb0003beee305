use async_trait::async_trait;
use taskhive_application::RoleAssignmentRepository;
use taskhive_core::{AppResult, OrganizationId, UserId};
use taskhive_domain::{RoleAssignment, RoleName};
use tokio::sync::RwLock;

/// In-memory role assignment repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleAssignmentRepository {
    assignments: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryRoleAssignmentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            assignments: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryRoleAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|assignment| assignment.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.assignments.write().await.push(assignment);
        Ok(())
    }

    async fn deactivate(
        &self,
        user_id: UserId,
        role: RoleName,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        for assignment in assignments.iter_mut() {
            // An absent scope deactivates the role across every scope.
            let scope_matches =
                organization_id.is_none() || assignment.organization_id() == organization_id;
            if assignment.user_id() == user_id && assignment.role() == role && scope_matches {
                assignment.deactivate();
            }
        }
        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: UserId) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        for assignment in assignments.iter_mut() {
            if assignment.user_id() == user_id {
                assignment.deactivate();
            }
        }
        Ok(())
    }
}
