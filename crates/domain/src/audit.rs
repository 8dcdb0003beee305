use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhive_core::AppError;

/// Stable audit actions recorded for access decisions and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A record was created.
    Create,
    /// A record or listing was read.
    Read,
    /// A record was modified.
    Update,
    /// A record was removed.
    Delete,
    /// A principal authenticated.
    Login,
    /// A principal ended its session.
    Logout,
    /// An authorization check denied the request.
    AccessDenied,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::AccessDenied => "access_denied",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            "access_denied" => Ok(Self::AccessDenied),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn action_roundtrip_storage_value() {
        let restored = AuditAction::from_str(AuditAction::AccessDenied.as_str());
        assert_eq!(restored.ok(), Some(AuditAction::AccessDenied));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(AuditAction::from_str("export").is_err());
    }
}
