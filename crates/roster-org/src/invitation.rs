//! Invitation domain models
//!
//! An invitation is an offer of membership addressed to an email. It moves
//! through a one-way state machine:
//!
//! ```text
//! Pending ─┬─→ Accepted   (invitee redeemed the token)
//!          ├─→ Cancelled  (inviter or an Admin withdrew it)
//!          └─→ Expired    (deadline passed, applied by the sweeper)
//! ```
//!
//! All three outcomes are terminal. Validity is time-dependent: a Pending
//! invitation past its deadline is already invalid even before the sweeper marks
//! it Expired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MembershipError, MembershipResult};
use crate::roles::UserRole;
use crate::user::normalize_email;

/// Invitation status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting acceptance
    Pending,

    /// Redeemed; a user was created
    Accepted,

    /// Withdrawn before acceptance
    Cancelled,

    /// Deadline passed before acceptance
    Expired,
}

impl InvitationStatus {
    /// Check if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Check if moving from this status to `next` is allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_org::InvitationStatus;
    ///
    /// assert!(InvitationStatus::Pending.can_transition_to(InvitationStatus::Accepted));
    /// assert!(!InvitationStatus::Expired.can_transition_to(InvitationStatus::Accepted));
    /// assert!(!InvitationStatus::Pending.can_transition_to(InvitationStatus::Pending));
    /// ```
    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        *self == Self::Pending && next != Self::Pending
    }

    /// Parse status from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to invite someone into the actor's organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteRequest {
    /// Invitee email
    pub email: String,

    /// Invitee given name
    pub first_name: String,

    /// Invitee family name
    pub last_name: String,

    /// Role the invitee receives on acceptance
    pub role: UserRole,
}

impl InviteRequest {
    /// Creates a new invite request.
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
        }
    }
}

/// An offer of membership.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
/// use roster_org::{Invitation, InviteRequest, UserRole};
///
/// let now = Utc::now();
/// let request = InviteRequest::new("new@example.com", "New", "Hire", UserRole::Member);
/// let invitation = Invitation::new(
///     request,
///     Uuid::now_v7(),
///     Uuid::now_v7(),
///     "opaque-token",
///     now,
///     Duration::hours(24),
/// );
///
/// assert!(invitation.is_valid_at(now));
/// assert!(!invitation.is_valid_at(now + Duration::hours(24)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Unique invitation ID
    pub id: Uuid,

    /// Invitee email (normalized)
    pub email: String,

    /// Invitee given name
    pub first_name: String,

    /// Invitee family name
    pub last_name: String,

    /// Role granted on acceptance
    pub role: UserRole,

    /// Organization the invitee joins
    pub organization_id: Uuid,

    /// User who sent the invitation
    pub invited_by: Uuid,

    /// Acceptance credential; unique and never changed after creation
    pub token: String,

    /// Current status
    pub status: InvitationStatus,

    /// Deadline for acceptance
    pub expires_at: DateTime<Utc>,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,

    /// When the invitation was accepted
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Creates a new Pending invitation.
    ///
    /// # Arguments
    ///
    /// * `request` - Invitee details and role
    /// * `organization_id` - Organization the invitee joins
    /// * `invited_by` - ID of the inviting user
    /// * `token` - Freshly generated acceptance token
    /// * `now` - Creation time
    /// * `ttl` - Time until the invitation expires
    pub fn new(
        request: InviteRequest,
        organization_id: Uuid,
        invited_by: Uuid,
        token: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: normalize_email(&request.email),
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role,
            organization_id,
            invited_by,
            token: token.into(),
            status: InvitationStatus::Pending,
            expires_at: now + ttl,
            created_at: now,
            accepted_at: None,
        }
    }

    /// Check if the invitation is still Pending.
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Check if the deadline has been reached at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the invitation can still be accepted at `now`.
    ///
    /// # Returns
    ///
    /// `true` when the status is Pending and `now` is before the deadline
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && !self.is_expired_at(now)
    }

    /// Hours between creation and the deadline.
    pub fn lifetime_hours(&self) -> i64 {
        (self.expires_at - self.created_at).num_hours()
    }

    /// Move the invitation to `next`.
    ///
    /// Sets `accepted_at` when `next` is Accepted.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` when the invitation is no longer Pending.
    pub fn transition(&mut self, next: InvitationStatus, at: DateTime<Utc>) -> MembershipResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(MembershipError::invalid(format!(
                "Invitation is no longer pending (status: {})",
                self.status
            )));
        }

        self.status = next;
        if next == InvitationStatus::Accepted {
            self.accepted_at = Some(at);
        }
        Ok(())
    }

    /// Build the display summary of this invitation.
    ///
    /// # Arguments
    ///
    /// * `organization_name` - Name of the invitation's organization
    /// * `invited_by_name` - Full name of the inviter
    pub fn summary(
        &self,
        organization_name: impl Into<String>,
        invited_by_name: impl Into<String>,
    ) -> InvitationSummary {
        InvitationSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            organization_id: self.organization_id,
            organization_name: organization_name.into(),
            invited_by_id: self.invited_by,
            invited_by_name: invited_by_name.into(),
            token: self.token.clone(),
            status: self.status,
            expires_at: self.expires_at,
            created_at: self.created_at,
            accepted_at: self.accepted_at,
        }
    }
}

/// Invitation with its organization and inviter names resolved, for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationSummary {
    /// Invitation ID
    pub id: Uuid,

    /// Invitee email
    pub email: String,

    /// Invitee given name
    pub first_name: String,

    /// Invitee family name
    pub last_name: String,

    /// Role granted on acceptance
    pub role: UserRole,

    /// Organization ID
    pub organization_id: Uuid,

    /// Organization name
    pub organization_name: String,

    /// Inviter ID
    pub invited_by_id: Uuid,

    /// Inviter full name
    pub invited_by_name: String,

    /// Acceptance token
    pub token: String,

    /// Status
    pub status: InvitationStatus,

    /// Deadline
    pub expires_at: DateTime<Utc>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Accepted timestamp
    pub accepted_at: Option<DateTime<Utc>>,
}
