//! Storage seam for membership state.
//!
//! The services read through this trait and write only through its conditional
//! operations, so every write that depends on an earlier read re-checks that read
//! at commit time:
//!
//! - user mutations carry a [`WriteGuard`] (administrator count plus the target's
//!   role and status as read);
//! - invitation status changes are compare-and-set from Pending;
//! - acceptance inserts the user and marks the invitation in one step.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use roster_org::{
    Invitation, InvitationStatus, MembershipError, MembershipResult, Organization, User, UserRole,
    UserStatus,
};

/// Preconditions a guarded user write re-checks at commit time.
///
/// The write commits only if the organization still has `admin_count` effective
/// administrators and the stored target still has `role` and `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    /// Effective administrators observed before the decision
    pub admin_count: u64,
    /// Target role observed before the decision
    pub role: UserRole,
    /// Target status observed before the decision
    pub status: UserStatus,
}

impl WriteGuard {
    /// Snapshot `target` and the administrator count it was judged against.
    pub fn for_user(target: &User, admin_count: u64) -> Self {
        Self {
            admin_count,
            role: target.role,
            status: target.status,
        }
    }

    /// Check if `stored` and `current_admins` still match the snapshot.
    pub fn holds(&self, stored: &User, current_admins: u64) -> bool {
        self.admin_count == current_admins && self.role == stored.role && self.status == stored.status
    }
}

/// Persistence operations the membership core needs.
///
/// Implementations must make each method atomic with respect to the others.
/// Uniqueness violations and failed preconditions surface as `Conflict`; an
/// unavailable backend surfaces as `Transient`.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert an organization together with its founding user.
    ///
    /// `Conflict` when the organization name or the founder's username is taken.
    async fn create_organization(
        &self,
        organization: Organization,
        founder: User,
    ) -> MembershipResult<(Organization, User)>;

    /// Load an organization.
    async fn get_organization(&self, id: Uuid) -> MembershipResult<Option<Organization>>;

    /// Load a user.
    async fn get_user(&self, id: Uuid) -> MembershipResult<Option<User>>;

    /// Find a user of `organization_id` by normalized email.
    async fn find_user_by_email_in_org(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> MembershipResult<Option<User>>;

    /// All users of an organization, oldest first.
    async fn list_users(&self, organization_id: Uuid) -> MembershipResult<Vec<User>>;

    /// Count effective administrators of an organization.
    async fn count_admins(&self, organization_id: Uuid) -> MembershipResult<u64>;

    /// Insert a new user.
    ///
    /// `Conflict` when the username, or the email within the organization, is taken.
    async fn insert_user(&self, user: User) -> MembershipResult<User>;

    /// Replace a user if `guard` still holds.
    ///
    /// `NotFound` when the user is gone; `Conflict` when the guard no longer holds.
    async fn update_user_guarded(&self, user: User, guard: WriteGuard) -> MembershipResult<User>;

    /// Delete a user if `guard` still holds.
    ///
    /// `NotFound` when the user is gone; `Conflict` when the guard no longer holds.
    async fn delete_user_guarded(&self, user_id: Uuid, guard: WriteGuard) -> MembershipResult<()>;

    /// Insert a new Pending invitation.
    ///
    /// `Conflict` when a Pending invitation already exists for the same email and
    /// organization, or when the token is taken.
    async fn insert_invitation(&self, invitation: Invitation) -> MembershipResult<Invitation>;

    /// Load an invitation by ID.
    async fn get_invitation(&self, id: Uuid) -> MembershipResult<Option<Invitation>>;

    /// Load an invitation by token.
    async fn find_invitation_by_token(&self, token: &str) -> MembershipResult<Option<Invitation>>;

    /// Find the Pending invitation for an email and organization, expired or not.
    async fn find_pending_invitation(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> MembershipResult<Option<Invitation>>;

    /// Invitations of an organization, optionally filtered by status, oldest first.
    async fn list_invitations(
        &self,
        organization_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> MembershipResult<Vec<Invitation>>;

    /// Pending invitations whose deadline is strictly before `now`.
    async fn find_expired_pending(&self, now: DateTime<Utc>) -> MembershipResult<Vec<Invitation>>;

    /// Move a Pending invitation to `to`.
    ///
    /// `NotFound` when absent; `InvalidOperation` when it is no longer Pending.
    async fn transition_invitation(
        &self,
        id: Uuid,
        to: InvitationStatus,
        at: DateTime<Utc>,
    ) -> MembershipResult<Invitation>;

    /// Insert `user` and mark the invitation Accepted, all or nothing.
    ///
    /// `NotFound` when the invitation is absent; `InvalidOperation` when it is not
    /// valid at `now`; `Conflict` when the username or email is taken.
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user: User,
        now: DateTime<Utc>,
    ) -> MembershipResult<(Invitation, User)>;
}

/// Await a storage call, failing with `Transient` once `timeout` elapses.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> MembershipResult<T>
where
    F: Future<Output = MembershipResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Storage call timed out");
            Err(MembershipError::transient(format!(
                "Storage call timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}
