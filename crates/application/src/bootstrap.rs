//! Explicit, idempotent initialization of the minimum data a fresh
//! deployment needs: one root organization and one Owner.
//!
//! The permission catalog and the per-role default grants are compile-time
//! data on [`taskhive_domain::RoleName`], so nothing is seeded for them;
//! invoking this procedure is the composition root's job and never a side
//! effect of constructing a service.

use std::sync::Arc;

use taskhive_core::{AppResult, OrganizationId, RoleAssignmentId, UserId};
use taskhive_domain::{EmailAddress, Organization, RoleAssignment, RoleName, User};

use crate::ports::{OrganizationRepository, RoleAssignmentRepository, UserRepository};

/// Explicit configuration for the seed procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    /// Name of the root organization.
    pub organization_name: String,
    /// Optional description of the root organization.
    pub organization_description: Option<String>,
    /// Email address of the initial Owner.
    pub owner_email: String,
    /// Given name of the initial Owner.
    pub owner_first_name: String,
    /// Family name of the initial Owner.
    pub owner_last_name: String,
}

/// What the seed run found or created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Root organization identifier.
    pub organization_id: OrganizationId,
    /// Initial Owner identifier.
    pub owner_user_id: UserId,
    /// Whether the organization was created by this run.
    pub created_organization: bool,
    /// Whether the Owner user was created by this run.
    pub created_owner: bool,
    /// Whether the Owner assignment was created by this run.
    pub created_assignment: bool,
}

/// Upserts the root organization, the initial Owner user, and its Owner
/// assignment. Safe to invoke repeatedly; a second run changes nothing.
pub async fn seed(
    config: &SeedConfig,
    organizations: &Arc<dyn OrganizationRepository>,
    users: &Arc<dyn UserRepository>,
    assignments: &Arc<dyn RoleAssignmentRepository>,
) -> AppResult<SeedSummary> {
    let (organization, created_organization) =
        match organizations.find_by_name(config.organization_name.trim()).await? {
            Some(existing) => (existing, false),
            None => {
                let organization = Organization::new(
                    OrganizationId::new(),
                    config.organization_name.trim(),
                    config.organization_description.clone(),
                    None,
                )?;
                organizations.insert(organization.clone()).await?;
                (organization, true)
            }
        };

    let owner_email = EmailAddress::new(config.owner_email.as_str())?;
    let (owner, created_owner) = match users.find_user_by_email(&owner_email).await? {
        Some(existing) => (existing, false),
        None => {
            let owner = User::new(
                UserId::new(),
                owner_email.as_str(),
                config.owner_first_name.as_str(),
                config.owner_last_name.as_str(),
                organization.id(),
            )?;
            users.insert_user(owner.clone()).await?;
            (owner, true)
        }
    };

    let has_owner_assignment = assignments
        .list_for_user(owner.id())
        .await?
        .iter()
        .any(|assignment| assignment.is_active() && assignment.role() == RoleName::Owner);

    let created_assignment = if has_owner_assignment {
        false
    } else {
        assignments
            .insert(RoleAssignment::new(
                RoleAssignmentId::new(),
                owner.id(),
                RoleName::Owner,
                None,
            ))
            .await?;
        true
    };

    Ok(SeedSummary {
        organization_id: organization.id(),
        owner_user_id: owner.id(),
        created_organization,
        created_owner,
        created_assignment,
    })
}
