use std::collections::BTreeSet;

use async_trait::async_trait;
use taskhive_core::{AppResult, OrganizationId, UserId};
use taskhive_domain::{EmailAddress, User};

/// Repository port for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by identifier.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by unique email address.
    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>>;

    /// Persists a new user.
    async fn insert_user(&self, user: User) -> AppResult<()>;

    /// Replaces an existing user record.
    async fn update_user(&self, user: User) -> AppResult<()>;

    /// Lists users belonging to any of the given organizations, ordered by
    /// email.
    async fn list_users_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<User>>;

    /// Counts users belonging to one organization.
    async fn count_users_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<u64>;
}
