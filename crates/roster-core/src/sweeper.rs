//! Expiry sweeper.
//!
//! Periodically marks Pending invitations past their deadline as Expired. Each
//! transition is a compare-and-set, so an invitation accepted or cancelled
//! between the scan and the write is left alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;

use roster_org::{InvitationStatus, MembershipError, MembershipResult};

use crate::clock::Clock;
use crate::config::RosterConfig;
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::{bounded, MembershipStore};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Invitations found past their deadline
    pub scanned: usize,
    /// Invitations this sweep moved to Expired
    pub expired: usize,
    /// Invitations resolved by someone else before the write
    pub skipped: usize,
    /// Invitations whose transition failed
    pub failed: usize,
}

/// Background task expiring overdue invitations.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    timeout: Duration,
    retry: RetryConfig,
}

impl std::fmt::Debug for ExpirySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirySweeper")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExpirySweeper {
    /// Create a sweeper using the configured interval and storage timeout.
    ///
    /// An out-of-range config is logged and its durations are clamped, see
    /// [`RosterConfig::sweep_interval`].
    pub fn new(store: Arc<dyn MembershipStore>, clock: Arc<dyn Clock>, config: &RosterConfig) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "Sweeper configuration out of range, using clamped values");
        }

        Self {
            store,
            clock,
            interval: config.sweep_interval(),
            timeout: config.store_timeout(),
            retry: RetryConfig::fast(),
        }
    }

    /// Override the retry policy for single transitions.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Start the background sweep that runs every configured interval.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.interval);

            loop {
                sweep_interval.tick().await;

                if let Err(e) = self.sweep_now().await {
                    tracing::error!(error = %e, "Invitation sweep failed");
                }
            }
        })
    }

    /// Sweep at the clock's current time.
    pub async fn sweep_now(&self) -> MembershipResult<SweepReport> {
        self.sweep(self.clock.now()).await
    }

    /// Expire every Pending invitation whose deadline is before `now`.
    ///
    /// A failed transition is logged and the sweep carries on with the rest.
    ///
    /// # Errors
    ///
    /// Only when the initial scan fails.
    #[tracing::instrument(skip(self), fields(sweep.operation = "expire_invitations"))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> MembershipResult<SweepReport> {
        let due = bounded(self.timeout, self.store.find_expired_pending(now)).await?;
        let mut report = SweepReport {
            scanned: due.len(),
            ..SweepReport::default()
        };

        for invitation in due {
            let id = invitation.id;
            let result = with_retry_if(
                &self.retry,
                move || {
                    bounded(
                        self.timeout,
                        self.store
                            .transition_invitation(id, InvitationStatus::Expired, now),
                    )
                },
                MembershipError::is_retryable,
            )
            .await;

            match result {
                Ok(_) => report.expired += 1,
                Err(MembershipError::InvalidOperation(_)) | Err(MembershipError::NotFound(_)) => {
                    tracing::debug!(invitation_id = %id, "Invitation resolved before expiry");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(invitation_id = %id, error = %e, "Failed to expire invitation");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            expired = report.expired,
            skipped = report.skipped,
            failed = report.failed,
            "Invitation sweep completed"
        );
        Ok(report)
    }
}
