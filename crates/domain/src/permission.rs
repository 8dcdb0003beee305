use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhive_core::AppError;

/// Actions a permission can grant.
///
/// `Manage` subsumes the four CRUD actions on its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Create new records.
    Create,
    /// Read existing records.
    Read,
    /// Modify existing records.
    Update,
    /// Remove existing records.
    Delete,
    /// Full control over the resource.
    Manage,
}

impl PermissionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::Validation(format!(
                "unknown permission action '{value}'"
            ))),
        }
    }
}

/// Resources a permission can target.
///
/// `All` subsumes every concrete resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionResource {
    /// Task records.
    Task,
    /// User records.
    User,
    /// Organization records.
    Organization,
    /// Audit log entries.
    AuditLog,
    /// Every resource.
    All,
}

impl PermissionResource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::User => "user",
            Self::Organization => "organization",
            Self::AuditLog => "audit_log",
            Self::All => "all",
        }
    }
}

impl FromStr for PermissionResource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "task" => Ok(Self::Task),
            "user" => Ok(Self::User),
            "organization" => Ok(Self::Organization),
            "audit_log" => Ok(Self::AuditLog),
            "all" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown permission resource '{value}'"
            ))),
        }
    }
}

/// An (action, resource) capability grant.
///
/// Identified by the pair; the catalog holds at most one row per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Granted action.
    pub action: PermissionAction,
    /// Targeted resource.
    pub resource: PermissionResource,
}

impl Permission {
    /// Creates a permission for an (action, resource) pair.
    #[must_use]
    pub fn new(action: PermissionAction, resource: PermissionResource) -> Self {
        Self { action, resource }
    }

    /// Returns whether this permission grants the requested action on the
    /// requested resource, applying the `Manage`/`All` widening rules.
    #[must_use]
    pub fn grants(&self, action: PermissionAction, resource: PermissionResource) -> bool {
        let action_matches = self.action == action || self.action == PermissionAction::Manage;
        let resource_matches =
            self.resource == resource || self.resource == PermissionResource::All;

        action_matches && resource_matches
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}:{}",
            self.action.as_str(),
            self.resource.as_str()
        )
    }
}
