//! # Roster RBAC
//!
//! This crate provides the permission decisions for organization membership.
//!
//! ## Overview
//!
//! The roster-rbac crate handles:
//! - **Guard**: Whether an organization can lose one administrator
//! - **Permissions**: Who may manage whom, and which role changes are legal
//! - **Actions**: The vocabulary of guarded membership operations
//!
//! ## Architecture
//!
//! ```text
//! authorize_role_change ─┐
//! authorize_status_change├─→ can_manage ─→ same organization ─→ guard
//! authorize_removal ─────┘
//! ```
//!
//! Demotion, deactivation and removal each take an administrator out of the
//! effective count, so all three consult the same guard.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uuid::Uuid;
//! use roster_org::{User, UserRole};
//! use roster_rbac::{authorize_role_change, Decision};
//!
//! let org = Uuid::now_v7();
//! let admin = User::new(org, "a", "a@example.com", UserRole::Admin);
//! let other = User::new(org, "b", "b@example.com", UserRole::Admin);
//!
//! // Two administrators: demoting one is allowed.
//! let decision = authorize_role_change(&admin, &other, UserRole::Member, 2).unwrap();
//! assert_eq!(decision, Decision::Apply);
//!
//! // One administrator: rejected.
//! assert!(authorize_role_change(&admin, &other, UserRole::Member, 1).is_err());
//! ```
//!
//! ## Integration with roster-org
//!
//! Decisions are made over `roster_org::User` values and failures are reported as
//! `roster_org::MembershipError`.

pub mod actions;
pub mod guard;
pub mod permissions;

// Re-export main types for convenience
pub use actions::MemberAction;
pub use guard::{can_remove_admin_status, ensure_admin_remains};
pub use permissions::{
    authorize_cancel, authorize_create_user, authorize_invite, authorize_list_invitations,
    authorize_removal, authorize_role_change, authorize_status_change, authorize_view, can_manage,
    Decision,
};
