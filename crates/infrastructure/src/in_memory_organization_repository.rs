use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use taskhive_application::OrganizationRepository;
use taskhive_core::{AppError, AppResult, OrganizationId};
use taskhive_domain::Organization;
use tokio::sync::RwLock;

/// In-memory organization repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationRepository {
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
}

impl InMemoryOrganizationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            organizations: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn find(&self, organization_id: OrganizationId) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .read()
            .await
            .get(&organization_id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .read()
            .await
            .values()
            .find(|organization| organization.name().as_str() == name)
            .cloned())
    }

    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        let organizations = self.organizations.read().await;
        let mut children: Vec<Organization> = organizations
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
        let organizations = self.organizations.read().await;
        let mut listed: Vec<Organization> = organizations
            .values()
            .filter(|organization| organization_ids.contains(&organization.id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn insert(&self, organization: Organization) -> AppResult<()> {
        let mut organizations = self.organizations.write().await;

        if organizations
            .values()
            .any(|existing| existing.name() == organization.name())
        {
            return Err(AppError::Conflict(format!(
                "organization '{}' already exists",
                organization.name().as_str()
            )));
        }

        organizations.insert(organization.id(), organization);
        Ok(())
    }

    async fn update(&self, organization: Organization) -> AppResult<()> {
        self.organizations
            .write()
            .await
            .insert(organization.id(), organization);
        Ok(())
    }

    async fn delete(&self, organization_id: OrganizationId) -> AppResult<()> {
        self.organizations.write().await.remove(&organization_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use taskhive_application::OrganizationRepository;
    use taskhive_core::OrganizationId;
    use taskhive_domain::Organization;

    use super::InMemoryOrganizationRepository;

    #[tokio::test]
    async fn children_are_listed_by_name() {
        let repository = InMemoryOrganizationRepository::new();
        let parent_id = OrganizationId::new();

        for name in ["Acme", "Acme-Ops", "Acme-Eng"] {
            let parent = if name == "Acme" { None } else { Some(parent_id) };
            let id = if name == "Acme" {
                parent_id
            } else {
                OrganizationId::new()
            };
            let organization = Organization::new(id, name, None, parent);
            assert!(organization.is_ok());
            if let Ok(organization) = organization {
                assert!(repository.insert(organization).await.is_ok());
            }
        }

        let children = repository.list_children(parent_id).await;
        let Ok(children) = children else {
            return assert!(children.is_ok());
        };
        let names: Vec<&str> = children
            .iter()
            .map(|organization| organization.name().as_str())
            .collect();
        assert_eq!(names, vec!["Acme-Eng", "Acme-Ops"]);
    }

    #[tokio::test]
    async fn duplicate_name_insert_is_a_conflict() {
        let repository = InMemoryOrganizationRepository::new();
        let first = Organization::new(OrganizationId::new(), "Acme", None, None);
        let second = Organization::new(OrganizationId::new(), "Acme", None, None);
        assert!(first.is_ok() && second.is_ok());

        if let (Ok(first), Ok(second)) = (first, second) {
            assert!(repository.insert(first).await.is_ok());
            assert!(repository.insert(second).await.is_err());
        }
    }
}
