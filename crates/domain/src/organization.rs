use serde::{Deserialize, Serialize};
use taskhive_core::{AppResult, NonEmptyString, OrganizationId};

/// An organization in the two-level hierarchy.
///
/// `parent_id` is either absent (level-1 root) or refers to a level-1
/// organization. The depth cap is enforced by the creation path; the
/// entity only derives the level from the stored parent link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: NonEmptyString,
    description: Option<String>,
    parent_id: Option<OrganizationId>,
}

impl Organization {
    /// Creates an organization with a validated name.
    pub fn new(
        id: OrganizationId,
        name: impl Into<String>,
        description: Option<String>,
        parent_id: Option<OrganizationId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            description,
            parent_id,
        })
    }

    /// Returns the stable organization identifier.
    #[must_use]
    pub fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the unique organization name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the parent organization, if this is a level-2 organization.
    #[must_use]
    pub fn parent_id(&self) -> Option<OrganizationId> {
        self.parent_id
    }

    /// Returns the derived hierarchy level: 1 for roots, 2 for children.
    #[must_use]
    pub fn level(&self) -> u8 {
        if self.parent_id.is_none() { 1 } else { 2 }
    }

    /// Returns whether this organization is a direct child of another.
    #[must_use]
    pub fn is_child_of(&self, organization_id: OrganizationId) -> bool {
        self.parent_id == Some(organization_id)
    }

    /// Replaces the mutable fields (name, description).
    pub fn rename(&mut self, name: impl Into<String>, description: Option<String>) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        self.description = description;
        Ok(())
    }
}
