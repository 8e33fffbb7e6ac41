//! # Actions
//!
//! Membership operations that can take an administrator out of the count.
//! Actions name the operation in log fields and in rejection reasons.

use serde::{Deserialize, Serialize};

/// Guarded membership operations.
///
/// - **ChangeRole**: Assign a different role to another user
/// - **ChangeStatus**: Activate, deactivate or lock another user
/// - **Remove**: Delete another user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    /// Change another user's role.
    ///
    /// Demotion of an administrator is subject to the administrator guard.
    ChangeRole,

    /// Change another user's status.
    ///
    /// Deactivation of an administrator is subject to the administrator guard.
    ChangeStatus,

    /// Remove another user.
    ///
    /// Removal of an administrator is subject to the administrator guard.
    Remove,
}

impl MemberAction {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberAction::ChangeRole => "change_role",
            MemberAction::ChangeStatus => "change_status",
            MemberAction::Remove => "remove",
        }
    }

    /// Verb for the administrator guard rejection: what the action does to the
    /// last administrator.
    ///
    /// # Example
    ///
    /// ```
    /// use roster_rbac::MemberAction;
    ///
    /// assert_eq!(MemberAction::Remove.verb(), "remove");
    /// assert_eq!(MemberAction::ChangeStatus.verb(), "deactivate");
    /// ```
    pub fn verb(&self) -> &'static str {
        match self {
            MemberAction::ChangeRole => "demote",
            MemberAction::ChangeStatus => "deactivate",
            MemberAction::Remove => "remove",
        }
    }

    /// Phrase for the rejection of an actor targeting themselves.
    ///
    /// # Example
    ///
    /// ```
    /// use roster_rbac::MemberAction;
    ///
    /// assert_eq!(MemberAction::ChangeRole.on_self(), "change their own role");
    /// ```
    pub fn on_self(&self) -> &'static str {
        match self {
            MemberAction::ChangeRole => "change their own role",
            MemberAction::ChangeStatus => "change their own status",
            MemberAction::Remove => "remove themselves",
        }
    }
}

impl std::fmt::Display for MemberAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
