use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhive_core::{AppError, AppResult, NonEmptyString, OrganizationId, UserId};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lowercased email address.
    ///
    /// Performs basic structural validation: non-empty, exactly one `@`,
    /// non-empty local part and domain.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "malformed email address '{trimmed}'"
            )));
        }

        Ok(Self(trimmed))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EmailAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Account status for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// User may authenticate and act.
    Active,
    /// User is disabled without suspicion of abuse.
    Inactive,
    /// User is blocked pending review.
    Suspended,
}

impl UserStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::Validation(format!(
                "unknown user status '{value}'"
            ))),
        }
    }
}

/// A member of exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    first_name: NonEmptyString,
    last_name: NonEmptyString,
    status: UserStatus,
    organization_id: OrganizationId,
}

impl User {
    /// Creates a user with validated fields.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        organization_id: OrganizationId,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            email: EmailAddress::new(email)?,
            first_name: NonEmptyString::new(first_name)?,
            last_name: NonEmptyString::new(last_name)?,
            status: UserStatus::Active,
            organization_id,
        })
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the unique email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the given name.
    #[must_use]
    pub fn first_name(&self) -> &NonEmptyString {
        &self.first_name
    }

    /// Returns the family name.
    #[must_use]
    pub fn last_name(&self) -> &NonEmptyString {
        &self.last_name
    }

    /// Returns the account status.
    #[must_use]
    pub fn status(&self) -> UserStatus {
        self.status
    }

    /// Returns the home organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the display name composed from given and family name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.as_str(), self.last_name.as_str())
    }

    /// Replaces the account status.
    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use taskhive_core::{OrganizationId, UserId};

    use super::{EmailAddress, User};

    #[test]
    fn email_is_lowercased_and_validated() {
        let email = EmailAddress::new("Grace.Hopper@Example.COM");
        assert_eq!(
            email.map(|value| value.as_str().to_owned()).ok(),
            Some("grace.hopper@example.com".to_owned())
        );
        assert!(EmailAddress::new("not-an-email").is_err());
        assert!(EmailAddress::new("@example.com").is_err());
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let user = User::new(
            UserId::new(),
            "grace@example.com",
            "Grace",
            "Hopper",
            OrganizationId::new(),
        );
        assert_eq!(
            user.map(|value| value.full_name()).ok(),
            Some("Grace Hopper".to_owned())
        );
    }
}
