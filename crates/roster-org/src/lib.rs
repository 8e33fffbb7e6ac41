//! # Roster Organization Models
//!
//! This crate provides the domain models for organization membership management.
//!
//! ## Overview
//!
//! The roster-org crate handles:
//! - **Organizations**: Tenant boundary and unit of administrator counting
//! - **Users**: Identities inside exactly one organization, with a role and status
//! - **Invitations**: Offers of membership and their one-way state machine
//! - **Roles**: Admin, UnpaidAdmin and Member, kept apart from account statuses
//! - **Errors**: The shared `MembershipError` taxonomy
//!
//! ## Architecture
//!
//! ```text
//! Organization
//!   ├─ User (role, status)
//!   └─ Invitation ─→ invited_by: User
//!         └─ on acceptance: a new User with the invitation's email and role
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roster_org::{Organization, User, UserRole};
//!
//! let org = Organization::new("Acme Corp");
//! let admin = User::new(org.id, "ada", "ada@example.com", UserRole::Admin)
//!     .with_name("Ada", "Lovelace");
//! assert!(admin.counts_as_administrator());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support (enabled by default)

pub mod error;
pub mod invitation;
pub mod organization;
pub mod roles;
pub mod user;

// Re-export main types for convenience
pub use error::{ErrorKind, MembershipError, MembershipResult};
pub use invitation::{Invitation, InvitationStatus, InvitationSummary, InviteRequest};
pub use organization::Organization;
pub use roles::{UserRole, UserStatus};
pub use user::{normalize_email, NewUser, User, UserSummary};
