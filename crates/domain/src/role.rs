use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhive_core::AppError;

use crate::{Permission, PermissionAction, PermissionResource};

/// The fixed three-tier role hierarchy.
///
/// Levels establish a strict total order: Owner(3) > Admin(2) > Viewer(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Full system access and control.
    Owner,
    /// Administrative access with some restrictions.
    Admin,
    /// Read-only access to tasks and basic features.
    Viewer,
}

impl RoleName {
    /// Returns the hierarchy level for this role.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Viewer => 1,
        }
    }

    /// Returns whether this role sits at or above another role in the
    /// hierarchy.
    #[must_use]
    pub fn has_higher_or_equal_level(&self, other: RoleName) -> bool {
        self.level() >= other.level()
    }

    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Returns the human-readable role name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Admin => "Administrator",
            Self::Viewer => "Viewer",
        }
    }

    /// Returns all known roles, highest level first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleName] = &[RoleName::Owner, RoleName::Admin, RoleName::Viewer];

        ALL
    }

    /// Returns the seeded default permission set for this role.
    ///
    /// Owner holds every catalog row including the `manage:all` wildcard.
    /// Admin holds full task control plus read access to organizations,
    /// users, and the audit log. Viewer holds task read/create/update plus
    /// organization and user read; nothing else.
    #[must_use]
    pub fn default_permissions(&self) -> &'static [Permission] {
        const OWNER: &[Permission] = &[
            Permission {
                action: PermissionAction::Manage,
                resource: PermissionResource::All,
            },
            Permission {
                action: PermissionAction::Manage,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Manage,
                resource: PermissionResource::User,
            },
            Permission {
                action: PermissionAction::Manage,
                resource: PermissionResource::Organization,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::AuditLog,
            },
        ];

        const ADMIN: &[Permission] = &[
            Permission {
                action: PermissionAction::Create,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Update,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Delete,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Manage,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::Organization,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::AuditLog,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::User,
            },
        ];

        const VIEWER: &[Permission] = &[
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Create,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Update,
                resource: PermissionResource::Task,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::Organization,
            },
            Permission {
                action: PermissionAction::Read,
                resource: PermissionResource::User,
            },
        ];

        match self {
            Self::Owner => OWNER,
            Self::Admin => ADMIN,
            Self::Viewer => VIEWER,
        }
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}
