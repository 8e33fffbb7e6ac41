//! # Administrator guard
//!
//! Decides whether an organization can afford to lose one administrator.
//! The count passed in is always the count read *before* the mutation.

use roster_org::{MembershipError, MembershipResult};

use crate::actions::MemberAction;

/// Check if one administrator may be removed, demoted or deactivated.
///
/// # Arguments
///
/// * `current_admin_count` - Effective administrators in the organization before
///   the change
///
/// # Returns
///
/// `true` iff more than one administrator remains; zero fails closed
///
/// # Example
///
/// ```
/// use roster_rbac::can_remove_admin_status;
///
/// assert!(can_remove_admin_status(2));
/// assert!(!can_remove_admin_status(1));
/// assert!(!can_remove_admin_status(0));
/// ```
pub fn can_remove_admin_status(current_admin_count: u64) -> bool {
    current_admin_count > 1
}

/// Reject `action` when it would leave the organization without an administrator.
///
/// # Errors
///
/// `InvalidOperation` naming the action when `current_admin_count <= 1`.
pub fn ensure_admin_remains(current_admin_count: u64, action: MemberAction) -> MembershipResult<()> {
    if can_remove_admin_status(current_admin_count) {
        return Ok(());
    }

    Err(MembershipError::invalid(format!(
        "Cannot {} the last administrator of the organization",
        action.verb()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_threshold() {
        assert!(!can_remove_admin_status(0));
        assert!(!can_remove_admin_status(1));
        for count in 2..50 {
            assert!(can_remove_admin_status(count));
        }
    }

    #[test]
    fn test_ensure_admin_remains_messages() {
        assert!(ensure_admin_remains(2, MemberAction::Remove).is_ok());

        let err = ensure_admin_remains(1, MemberAction::ChangeRole).unwrap_err();
        assert_eq!(
            err,
            MembershipError::invalid("Cannot demote the last administrator of the organization")
        );

        let err = ensure_admin_remains(1, MemberAction::ChangeStatus).unwrap_err();
        assert!(err.reason().contains("deactivate"));
    }
}
