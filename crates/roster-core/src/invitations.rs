//! Invitation lifecycle service.
//!
//! Creation, lookup, cancellation and acceptance of invitations. Every status
//! change is a compare-and-set from Pending in the store, so an acceptance, a
//! cancellation and the expiry sweeper racing on one invitation resolve to
//! exactly one winner.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use roster_events::{InvitationNotice, Notifier};
use roster_org::{
    normalize_email, Invitation, InvitationStatus, InvitationSummary, InviteRequest,
    MembershipError, MembershipResult, Organization, User,
};
use roster_rbac::{authorize_cancel, authorize_invite, authorize_list_invitations};

use crate::clock::Clock;
use crate::config::RosterConfig;
use crate::password::{ensure_password_length, PasswordHasher};
use crate::store::{bounded, MembershipStore};
use crate::token::generate_token;

/// Invitation lifecycle operations.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn MembershipStore>,
    notifier: Arc<dyn Notifier>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    config: RosterConfig,
}

impl std::fmt::Debug for InvitationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationService")
            .field("config", &self.config)
            .finish()
    }
}

impl InvitationService {
    /// Create a new invitation service.
    pub fn new(
        store: Arc<dyn MembershipStore>,
        notifier: Arc<dyn Notifier>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        config: RosterConfig,
    ) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "Invitation configuration out of range, using clamped values");
        }

        Self {
            store,
            notifier,
            hasher,
            clock,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        self.config.store_timeout()
    }

    /// Check if `invitation` can still be accepted.
    pub fn is_valid(&self, invitation: &Invitation) -> bool {
        invitation.is_valid_at(self.clock.now())
    }

    /// Invite someone into the actor's organization.
    ///
    /// A stale Pending invitation for the same email (past its deadline but not
    /// yet swept) is marked Expired first; history is kept.
    ///
    /// The notice to the invitee is sent in the background. Delivery failures are
    /// logged and never undo the invitation.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: actor is not an administrator, or may not grant the role
    /// - `InvalidOperation`: email already a member, or a valid invitation exists
    /// - `Conflict`: a concurrent invite for the same email won
    #[instrument(skip(self, actor, request), fields(actor_id = %actor.id, role = %request.role))]
    pub async fn invite(&self, actor: &User, request: InviteRequest) -> MembershipResult<Invitation> {
        authorize_invite(actor, request.role)?;

        let email = normalize_email(&request.email);
        if email.is_empty() || !email.contains('@') {
            return Err(MembershipError::invalid(format!(
                "Invalid email address: {}",
                request.email
            )));
        }

        let organization = self.load_organization(actor.organization_id).await?;

        let member = bounded(
            self.timeout(),
            self.store
                .find_user_by_email_in_org(&email, organization.id),
        )
        .await?;
        if member.is_some() {
            return Err(MembershipError::invalid(
                "User with this email is already a member of the organization",
            ));
        }

        let now = self.clock.now();
        let pending = bounded(
            self.timeout(),
            self.store.find_pending_invitation(&email, organization.id),
        )
        .await?;
        if let Some(existing) = pending {
            if existing.is_valid_at(now) {
                return Err(MembershipError::invalid(
                    "An invitation is already pending for this email",
                ));
            }
            self.retire_stale(&existing, now).await?;
        }

        let invitation = Invitation::new(
            InviteRequest { email, ..request },
            organization.id,
            actor.id,
            generate_token(),
            now,
            self.config.invitation_ttl(),
        );
        let invitation = bounded(self.timeout(), self.store.insert_invitation(invitation)).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        let notice = InvitationNotice::for_invitation(
            &invitation,
            &organization,
            actor,
            self.config.acceptance_url(&invitation.token),
        );
        self.dispatch(notice);

        Ok(invitation)
    }

    /// Expire a Pending invitation that is past its deadline.
    async fn retire_stale(
        &self,
        stale: &Invitation,
        now: chrono::DateTime<chrono::Utc>,
    ) -> MembershipResult<()> {
        let result = bounded(
            self.timeout(),
            self.store
                .transition_invitation(stale.id, InvitationStatus::Expired, now),
        )
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(invitation_id = %stale.id, "Stale invitation expired");
                Ok(())
            }
            // Someone else resolved it first.
            Err(MembershipError::InvalidOperation(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Hand `notice` to the notifier without waiting for delivery.
    fn dispatch(&self, notice: InvitationNotice) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let recipient = notice.recipient_email.clone();
            let invitation_id = notice.invitation_id;
            match notifier.notify(notice).await {
                Ok(()) => {
                    tracing::info!(%recipient, %invitation_id, "Invitation notice sent");
                }
                Err(e) => {
                    tracing::warn!(
                        %recipient,
                        %invitation_id,
                        error = %e,
                        "Failed to send invitation notice"
                    );
                }
            }
        });
    }

    /// Valid invitations of the actor's organization, oldest first.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless the actor is an administrator.
    pub async fn pending_invitations(
        &self,
        actor: &User,
    ) -> MembershipResult<Vec<InvitationSummary>> {
        authorize_list_invitations(actor)?;

        let organization = self.load_organization(actor.organization_id).await?;
        let now = self.clock.now();

        let invitations = bounded(
            self.timeout(),
            self.store
                .list_invitations(organization.id, Some(InvitationStatus::Pending)),
        )
        .await?;
        let users = bounded(self.timeout(), self.store.list_users(organization.id)).await?;
        let names: HashMap<Uuid, String> = users.iter().map(|u| (u.id, u.full_name())).collect();

        Ok(invitations
            .into_iter()
            .filter(|i| i.is_valid_at(now))
            .map(|i| {
                let inviter = names.get(&i.invited_by).cloned().unwrap_or_default();
                i.summary(organization.name.clone(), inviter)
            })
            .collect())
    }

    /// Cancel a Pending invitation.
    ///
    /// # Errors
    ///
    /// - `NotFound`: invitation absent
    /// - `Unauthorized`: actor is neither the inviter nor an Admin, or belongs to
    ///   another organization
    /// - `InvalidOperation`: invitation no longer Pending
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn cancel(&self, invitation_id: Uuid, actor: &User) -> MembershipResult<Invitation> {
        let invitation = bounded(self.timeout(), self.store.get_invitation(invitation_id))
            .await?
            .ok_or_else(|| {
                MembershipError::not_found(format!("Invitation not found: {}", invitation_id))
            })?;

        authorize_cancel(actor, &invitation)?;

        let cancelled = bounded(
            self.timeout(),
            self.store.transition_invitation(
                invitation.id,
                InvitationStatus::Cancelled,
                self.clock.now(),
            ),
        )
        .await?;

        tracing::info!(invitation_id = %cancelled.id, "Invitation cancelled");
        Ok(cancelled)
    }

    /// Look up an invitation by its token.
    ///
    /// # Errors
    ///
    /// `NotFound` when no invitation carries `token`.
    pub async fn get_by_token(&self, token: &str) -> MembershipResult<Invitation> {
        bounded(self.timeout(), self.store.find_invitation_by_token(token))
            .await?
            .ok_or_else(|| MembershipError::not_found("Invalid invitation token"))
    }

    /// Look up an invitation by its token, with names resolved for display.
    pub async fn get_summary_by_token(&self, token: &str) -> MembershipResult<InvitationSummary> {
        let invitation = self.get_by_token(token).await?;
        let organization = self.load_organization(invitation.organization_id).await?;
        let inviter = bounded(self.timeout(), self.store.get_user(invitation.invited_by))
            .await?
            .map(|u| u.full_name())
            .unwrap_or_default();

        Ok(invitation.summary(organization.name, inviter))
    }

    /// Redeem an invitation, creating an active user.
    ///
    /// The user gets the invitation's email, names, role and organization. Creating
    /// the user and marking the invitation Accepted happen in one store step.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no invitation carries `token`
    /// - `InvalidOperation`: invitation not valid, password too short, or the
    ///   username or email is taken
    #[instrument(skip(self, token, password))]
    pub async fn accept(&self, token: &str, username: &str, password: &str) -> MembershipResult<User> {
        let invitation = self.get_by_token(token).await?;

        let now = self.clock.now();
        if !invitation.is_valid_at(now) {
            return Err(MembershipError::invalid("Invitation is invalid or expired"));
        }
        ensure_password_length(password, self.config.min_password_length)?;

        let password_hash = self.hasher.hash(password)?;
        let user = User::new(
            invitation.organization_id,
            username,
            &invitation.email,
            invitation.role,
        )
        .with_name(invitation.first_name.clone(), invitation.last_name.clone())
        .with_password_hash(password_hash)
        .created_at(now);

        let (invitation, user) = bounded(
            self.timeout(),
            self.store.accept_invitation(invitation.id, user, now),
        )
        .await
        .map_err(|e| match e {
            MembershipError::Conflict(reason) => MembershipError::InvalidOperation(reason),
            other => other,
        })?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %user.id,
            role = %user.role,
            "Invitation accepted"
        );
        Ok(user)
    }

    async fn load_organization(&self, organization_id: Uuid) -> MembershipResult<Organization> {
        bounded(self.timeout(), self.store.get_organization(organization_id))
            .await?
            .ok_or_else(|| {
                MembershipError::not_found(format!("Organization not found: {}", organization_id))
            })
    }
}
