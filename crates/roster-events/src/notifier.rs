//! Notifier implementation
//!
//! This module provides the notification abstraction the membership core
//! hands invitation notices to, plus an in-memory and a log-only implementation.

use crate::types::InvitationNotice;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Notifier error types.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery channel rejected or failed the notice
    #[error("Failed to deliver notice: {0}")]
    DeliveryError(String),

    /// Could not serialize the notice
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for notifier operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification delivery trait.
///
/// Delivery is best effort from the caller's point of view: a failure is
/// reported back but never undoes the invitation that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an invitation notice.
    async fn notify(&self, notice: InvitationNotice) -> NotifyResult<()>;

    /// Get notifier stats.
    async fn stats(&self) -> NotifierStats;
}

/// Notifier statistics.
#[derive(Debug, Clone, Default)]
pub struct NotifierStats {
    /// Notices handed to the notifier
    pub notices_received: u64,
    /// Notices delivered
    pub notices_delivered: u64,
    /// Live subscribers
    pub active_subscriptions: usize,
}

/// Subscription handle for receiving delivered notices.
pub struct NoticeSubscription {
    /// Notice receiver
    pub receiver: broadcast::Receiver<InvitationNotice>,
}

impl NoticeSubscription {
    /// Receive the next notice.
    pub async fn recv(&mut self) -> NotifyResult<InvitationNotice> {
        self.receiver
            .recv()
            .await
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

/// In-memory notifier.
///
/// Keeps every delivered notice and rebroadcasts it to subscribers. Suitable for
/// single-process setups and tests.
#[cfg(feature = "memory")]
pub struct MemoryNotifier {
    /// Delivered notices, oldest first
    delivered: Arc<RwLock<Vec<InvitationNotice>>>,
    /// Fan-out to subscribers
    sender: broadcast::Sender<InvitationNotice>,
    /// Statistics
    stats: Arc<RwLock<NotifierStats>>,
    /// Channel capacity
    channel_capacity: usize,
}

#[cfg(feature = "memory")]
impl std::fmt::Debug for MemoryNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNotifier")
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

#[cfg(feature = "memory")]
impl MemoryNotifier {
    /// Create a new in-memory notifier.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            delivered: Arc::new(RwLock::new(Vec::new())),
            sender,
            stats: Arc::new(RwLock::new(NotifierStats::default())),
            channel_capacity: capacity,
        }
    }

    /// Subscribe to notices delivered from now on.
    pub async fn subscribe(&self) -> NoticeSubscription {
        {
            let mut stats = self.stats.write().await;
            stats.active_subscriptions += 1;
        }

        NoticeSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Snapshot of every delivered notice.
    pub async fn delivered(&self) -> Vec<InvitationNotice> {
        self.delivered.read().await.clone()
    }

    /// Delivered notices addressed to `email`.
    pub async fn delivered_to(&self, email: &str) -> Vec<InvitationNotice> {
        self.delivered
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_email == email)
            .cloned()
            .collect()
    }
}

#[cfg(feature = "memory")]
impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "memory")]
#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notice: InvitationNotice) -> NotifyResult<()> {
        {
            let mut stats = self.stats.write().await;
            stats.notices_received += 1;
        }

        tracing::debug!(
            topic = notice.topic(),
            notice_id = %notice.id,
            recipient = %notice.recipient_email,
            "Notice recorded"
        );

        self.delivered.write().await.push(notice.clone());
        // No subscribers is fine.
        let _ = self.sender.send(notice);

        {
            let mut stats = self.stats.write().await;
            stats.notices_delivered += 1;
        }

        Ok(())
    }

    async fn stats(&self) -> NotifierStats {
        self.stats.read().await.clone()
    }
}

/// Notifier that only logs the rendered message.
///
/// Stands in for a mail channel in deployments without one.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    stats: RwLock<NotifierStats>,
}

impl TracingNotifier {
    /// Create a new tracing notifier.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notice: InvitationNotice) -> NotifyResult<()> {
        let payload = notice
            .log_payload()
            .map_err(|e| NotifyError::SerializationError(e.to_string()))?;

        tracing::info!(
            topic = notice.topic(),
            invitation_id = %notice.invitation_id,
            recipient = %notice.recipient_email,
            role = %notice.role,
            subject = %notice.subject(),
            %payload,
            "Invitation notice"
        );

        let mut stats = self.stats.write().await;
        stats.notices_received += 1;
        stats.notices_delivered += 1;
        Ok(())
    }

    async fn stats(&self) -> NotifierStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use roster_org::{Invitation, InviteRequest, Organization, User, UserRole};

    fn notice(email: &str) -> InvitationNotice {
        let org = Organization::new("Acme");
        let inviter = User::new(org.id, "ada", "ada@acme.test", UserRole::Admin);
        let invitation = Invitation::new(
            InviteRequest::new(email, "In", "Vitee", UserRole::Member),
            org.id,
            inviter.id,
            "tok",
            Utc::now(),
            Duration::hours(24),
        );
        InvitationNotice::for_invitation(&invitation, &org, &inviter, "http://localhost/accept-invitation?token=tok")
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn test_memory_notifier_subscribe() {
        let notifier = MemoryNotifier::new();
        let mut sub = notifier.subscribe().await;

        notifier.notify(notice("a@acme.test")).await.unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv()).await;
        assert!(received.is_ok());
        assert_eq!(received.unwrap().unwrap().recipient_email, "a@acme.test");
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn test_memory_notifier_records() {
        let notifier = MemoryNotifier::new();
        notifier.notify(notice("a@acme.test")).await.unwrap();
        notifier.notify(notice("b@acme.test")).await.unwrap();

        assert_eq!(notifier.delivered().await.len(), 2);
        assert_eq!(notifier.delivered_to("b@acme.test").await.len(), 1);
        assert!(notifier.delivered_to("c@acme.test").await.is_empty());
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn test_stats() {
        let notifier = MemoryNotifier::new();

        let stats = notifier.stats().await;
        assert_eq!(stats.notices_received, 0);
        assert_eq!(stats.active_subscriptions, 0);

        let _sub = notifier.subscribe().await;
        notifier.notify(notice("a@acme.test")).await.unwrap();

        let stats = notifier.stats().await;
        assert_eq!(stats.notices_received, 1);
        assert_eq!(stats.notices_delivered, 1);
        assert_eq!(stats.active_subscriptions, 1);
    }

    #[tokio::test]
    async fn test_tracing_notifier_counts() {
        let notifier = TracingNotifier::new();
        notifier.notify(notice("a@acme.test")).await.unwrap();
        assert_eq!(notifier.stats().await.notices_delivered, 1);
    }
}
