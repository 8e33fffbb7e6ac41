//! In-memory membership store.
//!
//! All state sits behind one lock, so every trait method is a single atomic
//! step: uniqueness checks, guarded writes and compare-and-set transitions all
//! observe and mutate a consistent snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use roster_org::{
    Invitation, InvitationStatus, MembershipError, MembershipResult, Organization, User,
};

use crate::store::{MembershipStore, WriteGuard};

#[derive(Debug, Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
    invitations: HashMap<Uuid, Invitation>,
    /// token -> invitation ID
    tokens: HashMap<String, Uuid>,
}

impl State {
    fn admin_count(&self, organization_id: Uuid) -> u64 {
        self.users
            .values()
            .filter(|u| u.organization_id == organization_id && u.counts_as_administrator())
            .count() as u64
    }

    fn ensure_user_unique(&self, user: &User) -> MembershipResult<()> {
        for existing in self.users.values() {
            if existing.id == user.id {
                continue;
            }
            if existing.username == user.username {
                return Err(MembershipError::conflict(format!(
                    "Username already taken: {}",
                    user.username
                )));
            }
            if existing.organization_id == user.organization_id && existing.email == user.email {
                return Err(MembershipError::conflict(format!(
                    "Email already registered in organization: {}",
                    user.email
                )));
            }
        }
        Ok(())
    }

    fn check_guard(&self, user_id: Uuid, guard: &WriteGuard) -> MembershipResult<&User> {
        let stored = self
            .users
            .get(&user_id)
            .ok_or_else(|| MembershipError::not_found(format!("User not found: {}", user_id)))?;

        let current = self.admin_count(stored.organization_id);
        if !guard.holds(stored, current) {
            return Err(MembershipError::conflict(format!(
                "User {} changed concurrently (administrators: expected {}, found {})",
                user_id, guard.admin_count, current
            )));
        }
        Ok(stored)
    }

    fn sorted<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
        let mut items: Vec<T> = items.collect();
        items.sort_by_key(|i| key(i));
        items
    }
}

/// In-memory [`MembershipStore`].
///
/// Clones share the same state. Suitable for single-process setups and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    /// Delay applied before every call
    latency: Option<Duration>,
    /// Remaining calls that fail with `Transient`
    failures: Arc<AtomicU32>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` calls fail with `Transient`.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    async fn enter(&self) -> MembershipResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(MembershipError::transient("Storage unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_organization(
        &self,
        organization: Organization,
        founder: User,
    ) -> MembershipResult<(Organization, User)> {
        self.enter().await?;
        let mut state = self.state.write().await;

        if state
            .organizations
            .values()
            .any(|o| o.name == organization.name)
        {
            return Err(MembershipError::conflict(format!(
                "Organization name already taken: {}",
                organization.name
            )));
        }
        state.ensure_user_unique(&founder)?;

        state
            .organizations
            .insert(organization.id, organization.clone());
        state.users.insert(founder.id, founder.clone());
        Ok((organization, founder))
    }

    async fn get_organization(&self, id: Uuid) -> MembershipResult<Option<Organization>> {
        self.enter().await?;
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn get_user(&self, id: Uuid) -> MembershipResult<Option<User>> {
        self.enter().await?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email_in_org(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> MembershipResult<Option<User>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.organization_id == organization_id && u.email == email)
            .cloned())
    }

    async fn list_users(&self, organization_id: Uuid) -> MembershipResult<Vec<User>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(State::sorted(
            state
                .users
                .values()
                .filter(|u| u.organization_id == organization_id)
                .cloned(),
            |u| (u.created_at, u.id),
        ))
    }

    async fn count_admins(&self, organization_id: Uuid) -> MembershipResult<u64> {
        self.enter().await?;
        Ok(self.state.read().await.admin_count(organization_id))
    }

    async fn insert_user(&self, user: User) -> MembershipResult<User> {
        self.enter().await?;
        let mut state = self.state.write().await;

        if !state.organizations.contains_key(&user.organization_id) {
            return Err(MembershipError::not_found(format!(
                "Organization not found: {}",
                user.organization_id
            )));
        }
        state.ensure_user_unique(&user)?;

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_guarded(&self, user: User, guard: WriteGuard) -> MembershipResult<User> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let stored = state.check_guard(user.id, &guard)?;
        if stored.organization_id != user.organization_id {
            return Err(MembershipError::invalid(
                "Users cannot move between organizations",
            ));
        }
        state.ensure_user_unique(&user)?;

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user_guarded(&self, user_id: Uuid, guard: WriteGuard) -> MembershipResult<()> {
        self.enter().await?;
        let mut state = self.state.write().await;

        state.check_guard(user_id, &guard)?;
        state.users.remove(&user_id);
        Ok(())
    }

    async fn insert_invitation(&self, invitation: Invitation) -> MembershipResult<Invitation> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let duplicate = state.invitations.values().any(|i| {
            i.is_pending()
                && i.organization_id == invitation.organization_id
                && i.email == invitation.email
        });
        if duplicate {
            return Err(MembershipError::conflict(format!(
                "A pending invitation already exists for {}",
                invitation.email
            )));
        }
        if state.tokens.contains_key(&invitation.token) {
            return Err(MembershipError::conflict("Invitation token already in use"));
        }

        state
            .tokens
            .insert(invitation.token.clone(), invitation.id);
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> MembershipResult<Option<Invitation>> {
        self.enter().await?;
        Ok(self.state.read().await.invitations.get(&id).cloned())
    }

    async fn find_invitation_by_token(&self, token: &str) -> MembershipResult<Option<Invitation>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(state
            .tokens
            .get(token)
            .and_then(|id| state.invitations.get(id))
            .cloned())
    }

    async fn find_pending_invitation(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> MembershipResult<Option<Invitation>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(state
            .invitations
            .values()
            .find(|i| i.is_pending() && i.organization_id == organization_id && i.email == email)
            .cloned())
    }

    async fn list_invitations(
        &self,
        organization_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> MembershipResult<Vec<Invitation>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(State::sorted(
            state
                .invitations
                .values()
                .filter(|i| i.organization_id == organization_id)
                .filter(|i| status.map_or(true, |s| i.status == s))
                .cloned(),
            |i| (i.created_at, i.id),
        ))
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> MembershipResult<Vec<Invitation>> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(State::sorted(
            state
                .invitations
                .values()
                .filter(|i| i.is_pending() && i.expires_at < now)
                .cloned(),
            |i| (i.expires_at, i.id),
        ))
    }

    async fn transition_invitation(
        &self,
        id: Uuid,
        to: InvitationStatus,
        at: DateTime<Utc>,
    ) -> MembershipResult<Invitation> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let invitation = state
            .invitations
            .get_mut(&id)
            .ok_or_else(|| MembershipError::not_found(format!("Invitation not found: {}", id)))?;
        invitation.transition(to, at)?;
        Ok(invitation.clone())
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user: User,
        now: DateTime<Utc>,
    ) -> MembershipResult<(Invitation, User)> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let mut invitation = state
            .invitations
            .get(&invitation_id)
            .cloned()
            .ok_or_else(|| {
                MembershipError::not_found(format!("Invitation not found: {}", invitation_id))
            })?;

        if !invitation.is_pending() {
            return Err(MembershipError::invalid("Invitation is no longer pending"));
        }
        if !invitation.is_valid_at(now) {
            return Err(MembershipError::invalid("Invitation is invalid or expired"));
        }
        state.ensure_user_unique(&user)?;

        invitation.transition(InvitationStatus::Accepted, now)?;
        state.users.insert(user.id, user.clone());
        state.invitations.insert(invitation.id, invitation.clone());
        Ok((invitation, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use roster_org::{ErrorKind, InviteRequest, UserRole, UserStatus};

    async fn seeded() -> (MemoryStore, Organization, User) {
        let store = MemoryStore::new();
        let org = Organization::new("Acme");
        let admin = User::new(org.id, "ada", "ada@acme.test", UserRole::Admin);
        let (org, admin) = store.create_organization(org, admin).await.unwrap();
        (store, org, admin)
    }

    fn invitation(org: &Organization, by: &User, email: &str, now: DateTime<Utc>) -> Invitation {
        Invitation::new(
            InviteRequest::new(email, "In", "Vitee", UserRole::Member),
            org.id,
            by.id,
            crate::token::generate_token(),
            now,
            ChronoDuration::hours(24),
        )
    }

    #[tokio::test]
    async fn test_organization_name_is_unique() {
        let (store, _, _) = seeded().await;
        let org = Organization::new("Acme");
        let founder = User::new(org.id, "other", "o@acme.test", UserRole::Admin);

        let err = store.create_organization(org, founder).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let (store, org, _) = seeded().await;

        let same_username = User::new(org.id, "ada", "x@acme.test", UserRole::Member);
        assert_eq!(
            store.insert_user(same_username).await.unwrap_err().kind(),
            ErrorKind::Conflict
        );

        let same_email = User::new(org.id, "ada2", "ADA@acme.test", UserRole::Member);
        assert_eq!(
            store.insert_user(same_email).await.unwrap_err().kind(),
            ErrorKind::Conflict
        );
    }

    #[tokio::test]
    async fn test_count_admins_excludes_inactive() {
        let (store, org, _) = seeded().await;
        store
            .insert_user(User::new(org.id, "u", "u@acme.test", UserRole::UnpaidAdmin))
            .await
            .unwrap();
        store
            .insert_user(
                User::new(org.id, "i", "i@acme.test", UserRole::Admin)
                    .with_status(UserStatus::Inactive),
            )
            .await
            .unwrap();
        store
            .insert_user(
                User::new(org.id, "l", "l@acme.test", UserRole::Admin).with_status(UserStatus::Locked),
            )
            .await
            .unwrap();

        assert_eq!(store.count_admins(org.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_guarded_update_rejects_stale_count() {
        let (store, org, _) = seeded().await;
        let second = store
            .insert_user(User::new(org.id, "b", "b@acme.test", UserRole::Admin))
            .await
            .unwrap();

        let stale = WriteGuard::for_user(&second, 3);
        let demoted = User {
            role: UserRole::Member,
            ..second.clone()
        };
        let err = store
            .update_user_guarded(demoted.clone(), stale)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let fresh = WriteGuard::for_user(&second, 2);
        store.update_user_guarded(demoted, fresh).await.unwrap();
        assert_eq!(store.count_admins(org.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_one_pending_invitation_per_email() {
        let (store, org, admin) = seeded().await;
        let now = Utc::now();

        store
            .insert_invitation(invitation(&org, &admin, "x@acme.test", now))
            .await
            .unwrap();
        let err = store
            .insert_invitation(invitation(&org, &admin, "x@acme.test", now))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let (store, org, admin) = seeded().await;
        let now = Utc::now();
        let inv = store
            .insert_invitation(invitation(&org, &admin, "x@acme.test", now))
            .await
            .unwrap();

        store
            .transition_invitation(inv.id, InvitationStatus::Expired, now)
            .await
            .unwrap();
        let err = store
            .transition_invitation(inv.id, InvitationStatus::Cancelled, now)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let stored = store.get_invitation(inv.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_accept_is_all_or_nothing() {
        let (store, org, admin) = seeded().await;
        let now = Utc::now();
        let inv = store
            .insert_invitation(invitation(&org, &admin, "x@acme.test", now))
            .await
            .unwrap();

        // Username collision: neither the user nor the status change lands.
        let clash = User::new(org.id, "ada", "x@acme.test", UserRole::Member);
        let err = store.accept_invitation(inv.id, clash, now).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(store.get_invitation(inv.id).await.unwrap().unwrap().is_pending());
        assert_eq!(store.list_users(org.id).await.unwrap().len(), 1);

        let user = User::new(org.id, "xavier", "x@acme.test", UserRole::Member);
        let (accepted, _) = store.accept_invitation(inv.id, user, now).await.unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.accepted_at, Some(now));
        assert_eq!(store.list_users(org.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_expired_pending_uses_strict_deadline() {
        let (store, org, admin) = seeded().await;
        let now = Utc::now();
        let inv = store
            .insert_invitation(invitation(&org, &admin, "x@acme.test", now))
            .await
            .unwrap();

        assert!(store.find_expired_pending(inv.expires_at).await.unwrap().is_empty());
        let due = store
            .find_expired_pending(inv.expires_at + ChronoDuration::seconds(1))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next() {
        let (store, org, _) = seeded().await;
        store.fail_next(1);

        let err = store.count_admins(org.id).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.count_admins(org.id).await.unwrap(), 1);
    }
}
