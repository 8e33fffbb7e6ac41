//! Roles and account statuses
//!
//! This module defines the role a user holds within their organization and the
//! status of their account. The two are distinct types so that a role can never
//! be compared against a status.

use serde::{Deserialize, Serialize};

/// User role within an organization.
///
/// # Permission Model
///
/// - **Admin**: Can manage every other user in the organization
/// - **UnpaidAdmin**: Can manage every other user except an Admin, and may not
///   grant the Admin role
/// - **Member**: Cannot manage anyone
///
/// Admin and UnpaidAdmin are both *administrators*: each one counts toward the
/// rule that an organization keeps at least one administrator.
///
/// # Examples
///
/// ```
/// use roster_org::UserRole;
///
/// assert!(UserRole::UnpaidAdmin.is_administrator());
/// assert!(!UserRole::Member.is_administrator());
/// assert!(!UserRole::UnpaidAdmin.can_manage_role(UserRole::Admin));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full administrative control
    Admin,

    /// Administrative control short of managing or minting Admins
    UnpaidAdmin,

    /// Regular member
    Member,
}

impl UserRole {
    /// Check if this role is an administrative role (Admin or UnpaidAdmin).
    pub fn is_administrator(&self) -> bool {
        matches!(self, Self::Admin | Self::UnpaidAdmin)
    }

    /// Check if a holder of this role may manage a user holding `target`.
    ///
    /// This is the role comparison only; the self-management rule lives in the
    /// permission engine because it needs identities, not roles.
    ///
    /// # Returns
    ///
    /// - Admin: `true` for every role
    /// - UnpaidAdmin: `true` unless `target` is Admin
    /// - Member: always `false`
    pub fn can_manage_role(&self, target: UserRole) -> bool {
        match self {
            Self::Admin => true,
            Self::UnpaidAdmin => target != Self::Admin,
            Self::Member => false,
        }
    }

    /// Check if a holder of this role may grant `role` to another user.
    ///
    /// UnpaidAdmin may not mint new Admins.
    pub fn can_grant(&self, role: UserRole) -> bool {
        match self {
            Self::Admin => true,
            Self::UnpaidAdmin => role != Self::Admin,
            Self::Member => false,
        }
    }

    /// Parse role from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(UserRole)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_org::UserRole;
    ///
    /// assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
    /// assert_eq!(UserRole::parse("UNPAID_ADMIN"), Some(UserRole::UnpaidAdmin));
    /// assert_eq!(UserRole::parse("owner"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "unpaid_admin" => Some(Self::UnpaidAdmin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    /// Get string representation of the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_org::UserRole;
    ///
    /// assert_eq!(UserRole::UnpaidAdmin.as_str(), "unpaid_admin");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::UnpaidAdmin => "unpaid_admin",
            Self::Member => "member",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::UnpaidAdmin => "Unpaid Admin",
            Self::Member => "Member",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status of a user.
///
/// - **Active**: Can sign in and act
/// - **Inactive**: Deactivated by an administrator; an inactive administrator
///   no longer counts toward the organization's administrator total
/// - **Locked**: Temporarily blocked from signing in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Account is enabled
    Active,

    /// Account has been deactivated
    Inactive,

    /// Account is locked
    Locked,
}

impl UserStatus {
    /// Parse status from string representation (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_org::UserStatus;
    ///
    /// assert_eq!(UserStatus::parse("INACTIVE"), Some(UserStatus::Inactive));
    /// assert_eq!(UserStatus::parse("deleted"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "locked" => Some(Self::Locked),
            _ => None,
        }
    }

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Locked => "locked",
        }
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrator_roles() {
        assert!(UserRole::Admin.is_administrator());
        assert!(UserRole::UnpaidAdmin.is_administrator());
        assert!(!UserRole::Member.is_administrator());
    }

    #[test]
    fn test_can_manage_role() {
        for target in [UserRole::Admin, UserRole::UnpaidAdmin, UserRole::Member] {
            assert!(UserRole::Admin.can_manage_role(target));
            assert!(!UserRole::Member.can_manage_role(target));
        }

        assert!(!UserRole::UnpaidAdmin.can_manage_role(UserRole::Admin));
        assert!(UserRole::UnpaidAdmin.can_manage_role(UserRole::UnpaidAdmin));
        assert!(UserRole::UnpaidAdmin.can_manage_role(UserRole::Member));
    }

    #[test]
    fn test_can_grant() {
        assert!(UserRole::Admin.can_grant(UserRole::Admin));
        assert!(!UserRole::UnpaidAdmin.can_grant(UserRole::Admin));
        assert!(UserRole::UnpaidAdmin.can_grant(UserRole::UnpaidAdmin));
        assert!(!UserRole::Member.can_grant(UserRole::Member));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("member"), Some(UserRole::Member));
        assert_eq!(UserRole::parse("Unpaid_Admin"), Some(UserRole::UnpaidAdmin));
        assert_eq!(UserRole::parse("invalid"), None);
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&UserRole::UnpaidAdmin).unwrap();
        assert_eq!(json, "\"unpaid_admin\"");

        let status: UserStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(status, UserStatus::Inactive);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(UserStatus::parse("active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::parse("LOCKED"), Some(UserStatus::Locked));
        assert_eq!(UserStatus::parse("gone"), None);
        assert_eq!(UserStatus::default(), UserStatus::Active);
    }
}
