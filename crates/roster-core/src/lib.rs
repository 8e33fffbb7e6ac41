//! # Roster Core
//!
//! Membership services: role and status changes under the administrator
//! invariant, the invitation lifecycle, and the expiry sweeper.
//!
//! ## Overview
//!
//! The roster-core crate handles:
//! - **Users**: `UserService` for organization bootstrap, creation, lookup, role
//!   and status changes and removal
//! - **Invitations**: `InvitationService` for invite, cancel, lookup by token and
//!   acceptance
//! - **Sweeper**: `ExpirySweeper` expiring overdue invitations on an interval
//! - **Storage**: the `MembershipStore` seam and an in-memory implementation
//! - **Configuration**: `RosterConfig` loaded from the environment
//!
//! ## Architecture
//!
//! ```text
//! caller ─→ UserService ───────┐
//!        ─→ InvitationService ─┼─→ roster_rbac (decide) ─→ MembershipStore (guarded write)
//!           ExpirySweeper ─────┘                          Notifier (invite only)
//! ```
//!
//! Every operation takes the acting user explicitly; resolving who is calling is
//! the caller's job.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roster_core::{
//!     InvitationService, MemoryStore, PasswordHasher, RosterConfig, SystemClock,
//! };
//! use roster_events::TracingNotifier;
//! use roster_org::{InviteRequest, MembershipResult, User, UserRole};
//!
//! struct Argon;
//! impl PasswordHasher for Argon {
//!     fn hash(&self, password: &str) -> MembershipResult<String> {
//!         Ok(format!("hashed:{}", password))
//!     }
//! }
//!
//! async fn invite(actor: &User) -> MembershipResult<()> {
//!     let service = InvitationService::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(TracingNotifier::new()),
//!         Arc::new(Argon),
//!         Arc::new(SystemClock),
//!         RosterConfig::from_env().unwrap_or_default(),
//!     );
//!
//!     let request = InviteRequest::new("new@example.com", "New", "Hire", UserRole::Member);
//!     let invitation = service.invite(actor, request).await?;
//!     println!("invitation: {}", invitation.id);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod invitations;
pub mod memory;
pub mod password;
pub mod retry;
pub mod store;
pub mod sweeper;
pub mod token;
pub mod users;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, RosterConfig, MAX_INVITATION_TTL_HOURS};
pub use invitations::InvitationService;
pub use memory::MemoryStore;
pub use password::PasswordHasher;
pub use store::{MembershipStore, WriteGuard};
pub use sweeper::{ExpirySweeper, SweepReport};
pub use token::generate_token;
pub use users::UserService;
