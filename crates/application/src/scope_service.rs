use std::collections::BTreeSet;
use std::sync::Arc;

use taskhive_core::{AppResult, OrganizationId, UserId};
use taskhive_domain::RoleName;

use crate::OrganizationHierarchy;
use crate::ports::{RoleAssignmentRepository, UserRepository};

/// Derives the set of organizations a principal's listing queries are
/// restricted to.
#[derive(Clone)]
pub struct ScopeService {
    users: Arc<dyn UserRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    hierarchy: OrganizationHierarchy,
}

impl ScopeService {
    /// Creates a scope filter from repository implementations.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        hierarchy: OrganizationHierarchy,
    ) -> Self {
        Self {
            users,
            assignments,
            hierarchy,
        }
    }

    /// Returns the organizations visible to a principal.
    ///
    /// Everyone sees their home organization. A principal holding an active
    /// Owner assignment additionally sees the direct children of its home
    /// organization; Admin and Viewer never receive the expansion. An
    /// unresolvable principal degenerates to the empty set (deny-all),
    /// never to an unfiltered query.
    pub async fn accessible_organizations(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeSet<OrganizationId>> {
        let Some(user) = self.users.find_user(user_id).await? else {
            return Ok(BTreeSet::new());
        };

        let home = user.organization_id();
        let mut accessible = BTreeSet::from([home]);

        let is_owner = self
            .assignments
            .list_for_user(user_id)
            .await?
            .iter()
            .any(|assignment| {
                assignment.applies_in(Some(home)) && assignment.role() == RoleName::Owner
            });

        if is_owner {
            for child in self.hierarchy.children(home).await? {
                accessible.insert(child);
            }
        }

        Ok(accessible)
    }
}
