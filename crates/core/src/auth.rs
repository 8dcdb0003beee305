use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrganizationId, UserId};

/// Authenticated principal reconstructed from a verified identity token.
///
/// Produced by the external authentication collaborator and trusted for the
/// lifetime of one request. The role claims are informational; authorization
/// decisions always re-derive the effective grants from stored assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject_id: UserId,
    organization_id: OrganizationId,
    roles: Vec<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Principal {
    /// Creates a principal from verified token claims.
    #[must_use]
    pub fn new(
        subject_id: UserId,
        organization_id: OrganizationId,
        roles: Vec<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            organization_id,
            roles,
            issued_at,
            expires_at,
        }
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> UserId {
        self.subject_id
    }

    /// Returns the principal's home organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the role name claims carried by the token.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.roles.as_slice()
    }

    /// Returns the token issue timestamp.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the token expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns whether the token has expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
