//! User domain models
//!
//! A user is an identity inside exactly one organization. The user's role decides
//! what they may do to other users; the status decides whether the account is
//! enabled and whether an administrator still counts toward the organization's
//! administrator total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::organization::Organization;
use crate::roles::{UserRole, UserStatus};

/// Normalize an email address for comparisons and uniqueness checks.
///
/// # Examples
///
/// ```
/// use roster_org::normalize_email;
///
/// assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A user belonging to one organization.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use roster_org::{User, UserRole};
///
/// let org_id = Uuid::now_v7();
/// let user = User::new(org_id, "ada", "ada@example.com", UserRole::Admin)
///     .with_name("Ada", "Lovelace");
/// assert!(user.is_enabled());
/// assert_eq!(user.full_name(), "Ada Lovelace");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Organization the user belongs to
    pub organization_id: Uuid,

    /// Unique username
    pub username: String,

    /// Email address, unique within the organization
    pub email: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Role within the organization
    pub role: UserRole,

    /// Account status
    pub status: UserStatus,

    /// Credential produced by the password hashing collaborator
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last signed in
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a new active user.
    ///
    /// The user is created with a newly generated UUID v7 ID, Active status, the
    /// current timestamp, empty names and no credential. The email is normalized.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The organization the user belongs to
    /// * `username` - Unique username
    /// * `email` - Email address
    /// * `role` - Role within the organization
    pub fn new(
        organization_id: Uuid,
        username: impl Into<String>,
        email: impl AsRef<str>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            organization_id,
            username: username.into(),
            email: normalize_email(email.as_ref()),
            first_name: String::new(),
            last_name: String::new(),
            role,
            status: UserStatus::Active,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Set the user's given and family names.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Set the account status.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the stored credential.
    pub fn with_password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = password_hash.into();
        self
    }

    /// Set both creation and update timestamps.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Given and family name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if the user holds the Admin role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user holds the UnpaidAdmin role.
    pub fn is_unpaid_admin(&self) -> bool {
        self.role == UserRole::UnpaidAdmin
    }

    /// Check if the user holds the Member role.
    pub fn is_member(&self) -> bool {
        self.role == UserRole::Member
    }

    /// Check if the user holds an administrative role, regardless of status.
    pub fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }

    /// Check if the user counts toward the organization's administrator total.
    ///
    /// Deactivated administrators do not count: deactivation, demotion and
    /// removal all take an administrator out of the total.
    pub fn counts_as_administrator(&self) -> bool {
        self.is_administrator() && self.status != UserStatus::Inactive
    }

    /// Check if the account is enabled (Active).
    pub fn is_enabled(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Check if the account is locked.
    pub fn is_locked(&self) -> bool {
        self.status == UserStatus::Locked
    }

    /// Record a successful sign-in.
    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    /// Build the credential-free summary of this user.
    ///
    /// # Arguments
    ///
    /// * `organization` - The user's organization, for its name
    pub fn summary(&self, organization: &Organization) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name(),
            role: self.role,
            status: self.status,
            organization_id: self.organization_id,
            organization_name: organization.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Request for administrative creation of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Unique username
    pub username: String,

    /// Email address
    pub email: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Requested role
    pub role: UserRole,

    /// Initial status, Active when absent
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl NewUser {
    /// Creates a new user request with Active status.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            status: None,
        }
    }

    /// Turn the request into a user of `organization_id`.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - Organization the user joins
    /// * `password_hash` - Credential from the hashing collaborator
    /// * `now` - Creation timestamp
    pub fn into_user(self, organization_id: Uuid, password_hash: String, now: DateTime<Utc>) -> User {
        User::new(organization_id, self.username, &self.email, self.role)
            .with_name(self.first_name, self.last_name)
            .with_status(self.status.unwrap_or_default())
            .with_password_hash(password_hash)
            .created_at(now)
    }
}

/// Credential-free view of a user for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email
    pub email: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Given and family name
    pub full_name: String,

    /// Role
    pub role: UserRole,

    /// Status
    pub status: UserStatus,

    /// Organization ID
    pub organization_id: Uuid,

    /// Organization name
    pub organization_name: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Updated timestamp
    pub updated_at: DateTime<Utc>,

    /// Last sign-in
    pub last_login_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let org_id = Uuid::now_v7();
        let user = User::new(org_id, "grace", "Grace@Example.com", UserRole::Member);

        assert_eq!(user.organization_id, org_id);
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.is_member());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_administrator_counting() {
        let org_id = Uuid::now_v7();
        let admin = User::new(org_id, "a", "a@example.com", UserRole::Admin);
        assert!(admin.counts_as_administrator());

        let locked = admin.clone().with_status(UserStatus::Locked);
        assert!(locked.counts_as_administrator());
        assert!(locked.is_locked());

        let inactive = admin.with_status(UserStatus::Inactive);
        assert!(inactive.is_administrator());
        assert!(!inactive.counts_as_administrator());

        let member = User::new(org_id, "m", "m@example.com", UserRole::Member);
        assert!(!member.counts_as_administrator());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(Uuid::now_v7(), "a", "a@example.com", UserRole::Admin)
            .with_password_hash("secret-hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_new_user_into_user() {
        let org_id = Uuid::now_v7();
        let now = Utc::now();
        let mut request = NewUser::new("lin", "Lin@Example.com", "Lin", "Yu", UserRole::UnpaidAdmin);
        request.status = Some(UserStatus::Locked);

        let user = request.into_user(org_id, "hash".to_string(), now);
        assert_eq!(user.email, "lin@example.com");
        assert_eq!(user.full_name(), "Lin Yu");
        assert_eq!(user.status, UserStatus::Locked);
        assert_eq!(user.created_at, now);
        assert_eq!(user.password_hash, "hash");
    }

    #[test]
    fn test_summary() {
        let org = Organization::new("Acme");
        let mut user = User::new(org.id, "a", "a@example.com", UserRole::Admin).with_name("A", "B");
        let at = Utc::now();
        user.record_login(at);

        let summary = user.summary(&org);
        assert_eq!(summary.organization_name, "Acme");
        assert_eq!(summary.full_name, "A B");
        assert_eq!(summary.last_login_at, Some(at));
    }
}
