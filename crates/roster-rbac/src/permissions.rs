//! # Permissions
//!
//! Decision functions over an acting user and a target. Every function here is
//! pure: the caller reads the current administrator count from storage, asks for
//! a decision, and then applies the mutation under a guarded write.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roster_org::{Invitation, MembershipError, MembershipResult, User, UserRole, UserStatus};

use crate::actions::MemberAction;
use crate::guard::ensure_admin_remains;

/// Outcome of an authorized mutation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The target already has the requested value; nothing to write.
    Unchanged,

    /// The mutation is allowed and should be persisted.
    Apply,
}

impl Decision {
    /// Check if the caller has something to persist.
    pub fn is_apply(&self) -> bool {
        matches!(self, Decision::Apply)
    }
}

/// Check if `actor` may manage `target`.
///
/// - Nobody manages themselves
/// - Admin manages any other user
/// - UnpaidAdmin manages any other user except an Admin
/// - Member manages no one
///
/// Organization membership is checked separately by the `authorize_*` functions.
///
/// # Example
///
/// ```
/// use uuid::Uuid;
/// use roster_org::{User, UserRole};
/// use roster_rbac::can_manage;
///
/// let org = Uuid::now_v7();
/// let admin = User::new(org, "a", "a@example.com", UserRole::Admin);
/// let member = User::new(org, "m", "m@example.com", UserRole::Member);
///
/// assert!(can_manage(&admin, &member));
/// assert!(!can_manage(&member, &admin));
/// assert!(!can_manage(&admin, &admin));
/// ```
pub fn can_manage(actor: &User, target: &User) -> bool {
    if actor.id == target.id {
        return false;
    }
    actor.role.can_manage_role(target.role)
}

/// Shared steps for every actor/target mutation: manage-ability, then organization.
fn ensure_manageable(actor: &User, target: &User, action: MemberAction) -> MembershipResult<()> {
    if actor.id == target.id {
        return Err(MembershipError::unauthorized(format!(
            "Users cannot {}",
            action.on_self()
        )));
    }

    if !can_manage(actor, target) {
        return Err(MembershipError::unauthorized(format!(
            "{} users cannot manage {} users",
            actor.role.display_name(),
            target.role.display_name()
        )));
    }

    if actor.organization_id != target.organization_id {
        return Err(MembershipError::unauthorized(
            "Cannot manage users in a different organization (cross-organization)",
        ));
    }

    Ok(())
}

/// Authorize assigning `new_role` to `target`.
///
/// Checks, in order:
/// 1. `actor` can manage `target`
/// 2. both belong to the same organization
/// 3. `new_role` equals the current role: `Unchanged`
/// 4. demoting an effective administrator to Member passes the administrator guard
/// 5. an UnpaidAdmin is not promoting to Admin
///
/// # Arguments
///
/// * `admin_count` - Effective administrators in the target's organization, read
///   before the change
///
/// # Errors
///
/// `Unauthorized` for steps 1, 2 and 5; `InvalidOperation` for step 4.
pub fn authorize_role_change(
    actor: &User,
    target: &User,
    new_role: UserRole,
    admin_count: u64,
) -> MembershipResult<Decision> {
    ensure_manageable(actor, target, MemberAction::ChangeRole)?;

    if new_role == target.role {
        return Ok(Decision::Unchanged);
    }

    if target.counts_as_administrator() && !new_role.is_administrator() {
        ensure_admin_remains(admin_count, MemberAction::ChangeRole)?;
    }

    if !actor.role.can_grant(new_role) {
        return Err(MembershipError::unauthorized(format!(
            "{} users cannot promote users to {}",
            actor.role.display_name(),
            new_role.display_name()
        )));
    }

    Ok(Decision::Apply)
}

/// Authorize deleting `target`.
///
/// Removing an effective administrator passes the administrator guard.
///
/// # Errors
///
/// `Unauthorized` when `actor` cannot manage `target` or the organizations
/// differ; `InvalidOperation` when `target` is the last administrator.
pub fn authorize_removal(actor: &User, target: &User, admin_count: u64) -> MembershipResult<()> {
    ensure_manageable(actor, target, MemberAction::Remove)?;

    if target.counts_as_administrator() {
        ensure_admin_remains(admin_count, MemberAction::Remove)?;
    }

    Ok(())
}

/// Authorize moving `target` to `new_status`.
///
/// Deactivating an effective administrator passes the administrator guard, the
/// same as removal. Locking does not take an administrator out of the count.
///
/// # Errors
///
/// `Unauthorized` when `actor` cannot manage `target` or the organizations
/// differ; `InvalidOperation` when `target` is the last administrator.
pub fn authorize_status_change(
    actor: &User,
    target: &User,
    new_status: UserStatus,
    admin_count: u64,
) -> MembershipResult<Decision> {
    ensure_manageable(actor, target, MemberAction::ChangeStatus)?;

    if new_status == target.status {
        return Ok(Decision::Unchanged);
    }

    if target.counts_as_administrator() && new_status == UserStatus::Inactive {
        ensure_admin_remains(admin_count, MemberAction::ChangeStatus)?;
    }

    Ok(Decision::Apply)
}

/// Authorize sending an invitation that grants `role`.
///
/// # Errors
///
/// `Unauthorized` unless `actor` is an administrator, or when an UnpaidAdmin
/// invites with the Admin role.
pub fn authorize_invite(actor: &User, role: UserRole) -> MembershipResult<()> {
    if !actor.is_administrator() {
        return Err(MembershipError::unauthorized(
            "Only administrators can invite users",
        ));
    }

    if !actor.role.can_grant(role) {
        return Err(MembershipError::unauthorized(format!(
            "{} users cannot invite users as {}",
            actor.role.display_name(),
            role.display_name()
        )));
    }

    Ok(())
}

/// Authorize cancelling `invitation`.
///
/// The inviter or any Admin of the same organization may cancel.
///
/// # Errors
///
/// `Unauthorized` otherwise.
pub fn authorize_cancel(actor: &User, invitation: &Invitation) -> MembershipResult<()> {
    if actor.id != invitation.invited_by && actor.role != UserRole::Admin {
        return Err(MembershipError::unauthorized(
            "Only the inviter or an Admin can cancel this invitation",
        ));
    }

    if actor.organization_id != invitation.organization_id {
        return Err(MembershipError::unauthorized(
            "Cannot cancel invitations of a different organization (cross-organization)",
        ));
    }

    Ok(())
}

/// Authorize listing the organization's valid invitations.
pub fn authorize_list_invitations(actor: &User) -> MembershipResult<()> {
    if actor.is_administrator() {
        Ok(())
    } else {
        Err(MembershipError::unauthorized(
            "Only administrators can view pending invitations",
        ))
    }
}

/// Authorize reading data of `organization_id`.
pub fn authorize_view(actor: &User, organization_id: Uuid) -> MembershipResult<()> {
    if actor.organization_id == organization_id {
        Ok(())
    } else {
        Err(MembershipError::unauthorized(
            "Access denied to users of a different organization",
        ))
    }
}

/// Authorize direct creation of a user with `role` in `organization_id`.
///
/// # Errors
///
/// `Unauthorized` unless `actor` is an administrator of `organization_id` that
/// may grant `role`.
pub fn authorize_create_user(
    actor: &User,
    organization_id: Uuid,
    role: UserRole,
) -> MembershipResult<()> {
    if !actor.is_administrator() {
        return Err(MembershipError::unauthorized(
            "Only administrators can create users",
        ));
    }

    authorize_view(actor, organization_id)?;

    if !actor.role.can_grant(role) {
        return Err(MembershipError::unauthorized(format!(
            "{} users cannot create users as {}",
            actor.role.display_name(),
            role.display_name()
        )));
    }

    Ok(())
}
