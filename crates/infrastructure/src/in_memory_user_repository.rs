use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use taskhive_application::UserRepository;
use taskhive_core::{AppResult, OrganizationId, UserId};
use taskhive_domain::{EmailAddress, User};
use tokio::sync::RwLock;

/// In-memory user repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        self.users.write().await.insert(user.id(), user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> AppResult<()> {
        self.users.write().await.insert(user.id(), user);
        Ok(())
    }

    async fn list_users_in_organizations(
        &self,
        organization_ids: &BTreeSet<OrganizationId>,
    ) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let mut listed: Vec<User> = users
            .values()
            .filter(|user| organization_ids.contains(&user.organization_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.email().as_str().cmp(right.email().as_str()));
        Ok(listed)
    }

    async fn count_users_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<u64> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.organization_id() == organization_id)
            .count() as u64)
    }
}
