//! # Roster Events
//!
//! This crate provides invitation notifications for roster membership management.
//!
//! ## Overview
//!
//! The roster-events crate handles:
//! - **Notice Types**: The outbound request created alongside an invitation
//! - **Notifier**: The async delivery seam the membership core calls
//! - **Rendering**: Subject and plain-text body of the invitation message
//!
//! ## Features
//!
//! - `memory` (default): In-memory notifier for single-process apps and tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roster_events::{MemoryNotifier, Notifier};
//!
//! async fn subscribe_example() {
//!     let notifier = MemoryNotifier::new();
//!     let mut sub = notifier.subscribe().await;
//!
//!     while let Ok(notice) = sub.recv().await {
//!         println!("{} -> {}", notice.subject(), notice.recipient_email);
//!     }
//! }
//! ```
//!
//! ## Delivery semantics
//!
//! Delivery is fire-and-forget from the caller's perspective. A failed notice is
//! logged by the caller and never rolls back the invitation.

pub mod notifier;
pub mod types;

// Re-export main types for convenience
#[cfg(feature = "memory")]
pub use notifier::MemoryNotifier;
pub use notifier::{NoticeSubscription, Notifier, NotifierStats, NotifyError, NotifyResult, TracingNotifier};
pub use types::InvitationNotice;
