use serde::{Deserialize, Serialize};
use taskhive_core::{OrganizationId, RoleAssignmentId, UserId};

use crate::RoleName;

/// A role granted to a user, optionally scoped to one organization.
///
/// Permission checking is additive across all active assignments of a user,
/// never reduced to the single highest role. A `None` organization scope is
/// a global grant that applies in every organization context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    id: RoleAssignmentId,
    user_id: UserId,
    role: RoleName,
    organization_id: Option<OrganizationId>,
    is_active: bool,
}

impl RoleAssignment {
    /// Creates an active role assignment.
    #[must_use]
    pub fn new(
        id: RoleAssignmentId,
        user_id: UserId,
        role: RoleName,
        organization_id: Option<OrganizationId>,
    ) -> Self {
        Self {
            id,
            user_id,
            role,
            organization_id,
            is_active: true,
        }
    }

    /// Returns the stable assignment identifier.
    #[must_use]
    pub fn id(&self) -> RoleAssignmentId {
        self.id
    }

    /// Returns the user holding the assignment.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role(&self) -> RoleName {
        self.role
    }

    /// Returns the organization scope, if the grant is not global.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    /// Returns whether the assignment currently grants anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Deactivates the assignment; the grant disappears on the next check.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Returns whether this assignment participates in a permission check.
    ///
    /// Without a context organization every active assignment participates.
    /// With one, global grants and grants scoped to that organization do.
    #[must_use]
    pub fn applies_in(&self, context: Option<OrganizationId>) -> bool {
        if !self.is_active {
            return false;
        }

        match context {
            None => true,
            Some(organization_id) => {
                self.organization_id.is_none() || self.organization_id == Some(organization_id)
            }
        }
    }
}
