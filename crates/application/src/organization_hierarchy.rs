use std::sync::Arc;

use taskhive_core::{AppError, AppResult, OrganizationId};

use crate::ports::OrganizationRepository;

/// Read model over the two-level organization tree.
///
/// Assumes the creation-path invariant that no stored organization has a
/// grandparent, so no query ever walks more than one hop.
#[derive(Clone)]
pub struct OrganizationHierarchy {
    organizations: Arc<dyn OrganizationRepository>,
}

impl OrganizationHierarchy {
    /// Creates a hierarchy resolver from a repository implementation.
    #[must_use]
    pub fn new(organizations: Arc<dyn OrganizationRepository>) -> Self {
        Self { organizations }
    }

    /// Returns the identifiers of the direct children of an organization.
    pub async fn children(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<OrganizationId>> {
        Ok(self
            .organizations
            .list_children(organization_id)
            .await?
            .into_iter()
            .map(|organization| organization.id())
            .collect())
    }

    /// Returns the parent of an organization, if it has one.
    pub async fn parent(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<OrganizationId>> {
        let organization = self
            .organizations
            .find(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' does not exist"))
            })?;

        Ok(organization.parent_id())
    }

    /// Returns the derived hierarchy level of an organization: 1 or 2.
    pub async fn level(&self, organization_id: OrganizationId) -> AppResult<u8> {
        let organization = self
            .organizations
            .find(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' does not exist"))
            })?;

        Ok(organization.level())
    }
}
