//! User management service.
//!
//! Role changes, status changes and removal follow the same shape: read the
//! target and the organization's administrator count, ask the permission
//! engine, then commit through a guarded write. A guarded write that loses a
//! race comes back as `Conflict` and the whole read-decide-write step is rerun.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use roster_org::{
    normalize_email, MembershipError, MembershipResult, NewUser, Organization, User, UserRole,
    UserStatus, UserSummary,
};
use roster_rbac::{
    authorize_create_user, authorize_removal, authorize_role_change, authorize_status_change,
    authorize_view, Decision,
};

use crate::clock::Clock;
use crate::config::RosterConfig;
use crate::password::{ensure_password_length, PasswordHasher};
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::{bounded, MembershipStore, WriteGuard};

/// Membership operations on existing users.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn MembershipStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    config: RosterConfig,
    /// Rerun policy for guarded writes that lost a race
    guarded_retry: RetryConfig,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("config", &self.config)
            .finish()
    }
}

fn is_lost_race(err: &MembershipError) -> bool {
    matches!(err, MembershipError::Conflict(_))
}

impl UserService {
    /// Create a new user service.
    pub fn new(
        store: Arc<dyn MembershipStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        config: RosterConfig,
    ) -> Self {
        let guarded_retry = RetryConfig {
            max_attempts: config.guarded_write_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(100),
            exponential_base: 2.0,
        };

        Self {
            store,
            hasher,
            clock,
            config,
            guarded_retry,
        }
    }

    fn timeout(&self) -> Duration {
        self.config.store_timeout()
    }

    /// Create an organization with `founder` as its first Admin.
    ///
    /// The founder's requested role and status are ignored: the founder is always
    /// an active Admin.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation`: password too short
    /// - `Conflict`: organization name or founder username taken
    #[instrument(skip(self, founder, password), fields(organization = %name))]
    pub async fn create_organization(
        &self,
        name: &str,
        description: Option<String>,
        founder: NewUser,
        password: &str,
    ) -> MembershipResult<(Organization, User)> {
        ensure_password_length(password, self.config.min_password_length)?;
        let password_hash = self.hasher.hash(password)?;
        let now = self.clock.now();

        let mut organization = Organization::new(name).created_at(now);
        organization.description = description;

        let founder = NewUser {
            role: UserRole::Admin,
            status: Some(UserStatus::Active),
            ..founder
        }
        .into_user(organization.id, password_hash, now);

        let (organization, founder) = bounded(
            self.timeout(),
            self.store.create_organization(organization, founder),
        )
        .await?;

        tracing::info!(
            organization_id = %organization.id,
            founder_id = %founder.id,
            "Organization created"
        );
        Ok((organization, founder))
    }

    /// Create a user in the actor's organization without an invitation.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: actor is not an administrator, or may not grant the role
    /// - `InvalidOperation`: password too short, email or username already taken
    #[instrument(skip(self, actor, request, password), fields(actor_id = %actor.id, role = %request.role))]
    pub async fn create_user(
        &self,
        actor: &User,
        request: NewUser,
        password: &str,
    ) -> MembershipResult<User> {
        authorize_create_user(actor, actor.organization_id, request.role)?;
        ensure_password_length(password, self.config.min_password_length)?;

        let email = normalize_email(&request.email);
        let existing = bounded(
            self.timeout(),
            self.store
                .find_user_by_email_in_org(&email, actor.organization_id),
        )
        .await?;
        if existing.is_some() {
            return Err(MembershipError::invalid(
                "User with this email already exists in the organization",
            ));
        }

        let password_hash = self.hasher.hash(password)?;
        let user = request.into_user(actor.organization_id, password_hash, self.clock.now());

        let user = bounded(self.timeout(), self.store.insert_user(user))
            .await
            .map_err(|e| match e {
                MembershipError::Conflict(reason) => MembershipError::InvalidOperation(reason),
                other => other,
            })?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Load a user of the actor's organization.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent; `Unauthorized` when the user belongs to another
    /// organization.
    pub async fn get_user(&self, actor: &User, user_id: Uuid) -> MembershipResult<User> {
        let user = self.load_user(user_id).await?;
        authorize_view(actor, user.organization_id)?;
        Ok(user)
    }

    /// Load the display summary of a user of the actor's organization.
    pub async fn get_user_summary(
        &self,
        actor: &User,
        user_id: Uuid,
    ) -> MembershipResult<UserSummary> {
        let user = self.get_user(actor, user_id).await?;
        let organization = self.load_organization(user.organization_id).await?;
        Ok(user.summary(&organization))
    }

    /// All users of the actor's organization.
    pub async fn list_users(&self, actor: &User) -> MembershipResult<Vec<User>> {
        bounded(self.timeout(), self.store.list_users(actor.organization_id)).await
    }

    /// Assign `new_role` to the target.
    ///
    /// Returns the target unchanged when it already holds `new_role`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: target absent
    /// - `Unauthorized`: see [`roster_rbac::authorize_role_change`]
    /// - `InvalidOperation`: the target is the last administrator
    /// - `Conflict`: the guarded write kept losing races
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn change_role(
        &self,
        actor: &User,
        target_id: Uuid,
        new_role: UserRole,
    ) -> MembershipResult<User> {
        with_retry_if(
            &self.guarded_retry,
            move || self.try_change_role(actor, target_id, new_role),
            is_lost_race,
        )
        .await
    }

    async fn try_change_role(
        &self,
        actor: &User,
        target_id: Uuid,
        new_role: UserRole,
    ) -> MembershipResult<User> {
        let (target, admin_count) = self.load_target(target_id).await?;

        if authorize_role_change(actor, &target, new_role, admin_count)? == Decision::Unchanged {
            return Ok(target);
        }

        let guard = WriteGuard::for_user(&target, admin_count);
        let previous = target.role;
        let updated = User {
            role: new_role,
            updated_at: self.clock.now(),
            ..target
        };

        let updated = bounded(self.timeout(), self.store.update_user_guarded(updated, guard)).await?;
        tracing::info!(
            target_id = %updated.id,
            from = %previous,
            to = %new_role,
            "User role changed"
        );
        Ok(updated)
    }

    /// Move the target to `new_status`.
    ///
    /// Returns the target unchanged when it already has `new_status`.
    ///
    /// # Errors
    ///
    /// Same as [`UserService::change_role`], with deactivation of the last
    /// administrator rejected.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn change_status(
        &self,
        actor: &User,
        target_id: Uuid,
        new_status: UserStatus,
    ) -> MembershipResult<User> {
        with_retry_if(
            &self.guarded_retry,
            move || self.try_change_status(actor, target_id, new_status),
            is_lost_race,
        )
        .await
    }

    async fn try_change_status(
        &self,
        actor: &User,
        target_id: Uuid,
        new_status: UserStatus,
    ) -> MembershipResult<User> {
        let (target, admin_count) = self.load_target(target_id).await?;

        if authorize_status_change(actor, &target, new_status, admin_count)? == Decision::Unchanged {
            return Ok(target);
        }

        let guard = WriteGuard::for_user(&target, admin_count);
        let previous = target.status;
        let updated = User {
            status: new_status,
            updated_at: self.clock.now(),
            ..target
        };

        let updated = bounded(self.timeout(), self.store.update_user_guarded(updated, guard)).await?;
        tracing::info!(
            target_id = %updated.id,
            from = %previous,
            to = %new_status,
            "User status changed"
        );
        Ok(updated)
    }

    /// Delete the target.
    ///
    /// # Errors
    ///
    /// Same as [`UserService::change_role`], with removal of the last
    /// administrator rejected.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn remove_user(&self, actor: &User, target_id: Uuid) -> MembershipResult<()> {
        with_retry_if(
            &self.guarded_retry,
            move || self.try_remove_user(actor, target_id),
            is_lost_race,
        )
        .await
    }

    async fn try_remove_user(&self, actor: &User, target_id: Uuid) -> MembershipResult<()> {
        let (target, admin_count) = self.load_target(target_id).await?;
        authorize_removal(actor, &target, admin_count)?;

        let guard = WriteGuard::for_user(&target, admin_count);
        bounded(self.timeout(), self.store.delete_user_guarded(target.id, guard)).await?;

        tracing::info!(target_id = %target.id, role = %target.role, "User removed");
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> MembershipResult<User> {
        bounded(self.timeout(), self.store.get_user(user_id))
            .await?
            .ok_or_else(|| MembershipError::not_found(format!("User not found: {}", user_id)))
    }

    async fn load_organization(&self, organization_id: Uuid) -> MembershipResult<Organization> {
        bounded(self.timeout(), self.store.get_organization(organization_id))
            .await?
            .ok_or_else(|| {
                MembershipError::not_found(format!("Organization not found: {}", organization_id))
            })
    }

    /// Read the target and its organization's administrator count.
    async fn load_target(&self, target_id: Uuid) -> MembershipResult<(User, u64)> {
        let target = self.load_user(target_id).await?;
        let admin_count = bounded(
            self.timeout(),
            self.store.count_admins(target.organization_id),
        )
        .await?;
        Ok((target, admin_count))
    }
}
