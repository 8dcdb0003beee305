use std::collections::BTreeSet;

use async_trait::async_trait;
use taskhive_core::{AppResult, OrganizationId};
use taskhive_domain::Organization;

/// Repository port for organization records.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Finds an organization by identifier.
    async fn find(&self, organization_id: OrganizationId) -> AppResult<Option<Organization>>;

    /// Finds an organization by unique name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>>;

    /// Lists the direct children of an organization, ordered by name.
    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>>;

    /// Lists the organizations with the given identifiers, ordered by name.
    async fn list_by_ids(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<Organization>>;

    /// Persists a new organization.
    async fn insert(&self, organization: Organization) -> AppResult<()>;

    /// Replaces an existing organization record.
    async fn update(&self, organization: Organization) -> AppResult<()>;

    /// Removes an organization record.
    async fn delete(&self, organization_id: OrganizationId) -> AppResult<()>;
}
