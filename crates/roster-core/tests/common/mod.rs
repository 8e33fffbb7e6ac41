//! Shared fixture for roster-core integration tests.
//!
//! Builds the services over an in-memory store, a manual clock and a recording
//! notifier, with an "Acme" organization founded by an Admin.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use roster_core::{
    Clock, ExpirySweeper, InvitationService, ManualClock, MemoryStore, PasswordHasher, RosterConfig,
    UserService,
};
use roster_events::{
    InvitationNotice, MemoryNotifier, NoticeSubscription, Notifier, NotifierStats, NotifyError,
    NotifyResult,
};
use roster_org::{InviteRequest, MembershipResult, NewUser, Organization, User, UserRole};

pub const PASSWORD: &str = "correct-horse";

/// Hasher that tags the password instead of hashing it.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> MembershipResult<String> {
        Ok(format!("plain${}", password))
    }
}

/// Notifier whose every delivery fails.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicU32,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notice: InvitationNotice) -> NotifyResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::DeliveryError("smtp relay unavailable".to_string()))
    }

    async fn stats(&self) -> NotifierStats {
        NotifierStats {
            notices_received: u64::from(self.attempts.load(Ordering::SeqCst)),
            ..NotifierStats::default()
        }
    }
}

/// Test fixture providing wired services and a founded organization.
pub struct TestFixture {
    /// Backing store, shared with the services.
    pub store: MemoryStore,
    /// Clock shared with the services.
    pub clock: ManualClock,
    /// Recording notifier.
    pub notifier: Arc<MemoryNotifier>,
    /// Service configuration.
    pub config: RosterConfig,
    pub users: UserService,
    pub invitations: InvitationService,
    pub sweeper: ExpirySweeper,
    /// The "Acme" organization.
    pub org: Organization,
    /// Acme's founding Admin.
    pub admin: User,
}

impl TestFixture {
    /// Fixture over a plain in-memory store.
    pub async fn new() -> Self {
        Self::with(MemoryStore::new(), RosterConfig::default(), None).await
    }

    /// Fixture whose store delays every call, so concurrent operations interleave.
    pub async fn interleaved() -> Self {
        Self::with(
            MemoryStore::new().with_latency(Duration::from_millis(1)),
            RosterConfig::default(),
            None,
        )
        .await
    }

    /// Fixture with a custom notifier in place of the recording one.
    pub async fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self::with(MemoryStore::new(), RosterConfig::default(), Some(notifier)).await
    }

    pub async fn with(
        store: MemoryStore,
        config: RosterConfig,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        let recorder = Arc::new(MemoryNotifier::new());
        let notifier: Arc<dyn Notifier> = match notifier {
            Some(notifier) => notifier,
            None => recorder.clone(),
        };

        let users = UserService::new(
            Arc::new(store.clone()),
            Arc::new(PlainHasher),
            Arc::new(clock.clone()),
            config.clone(),
        );
        let invitations = InvitationService::new(
            Arc::new(store.clone()),
            notifier,
            Arc::new(PlainHasher),
            Arc::new(clock.clone()),
            config.clone(),
        );
        let sweeper = ExpirySweeper::new(Arc::new(store.clone()), Arc::new(clock.clone()), &config);

        let (org, admin) = users
            .create_organization(
                "Acme",
                Some("Rockets and anvils".to_string()),
                NewUser::new("ada", "ada@acme.test", "Ada", "Lovelace", UserRole::Admin),
                PASSWORD,
            )
            .await
            .expect("founding Acme");

        Self {
            store,
            clock,
            notifier: recorder,
            config,
            users,
            invitations,
            sweeper,
            org,
            admin,
        }
    }

    /// Create an Acme user with `role`, as the founding Admin.
    pub async fn add_user(&self, username: &str, role: UserRole) -> User {
        self.users
            .create_user(&self.admin, new_user(username, role), PASSWORD)
            .await
            .expect("creating user")
    }

    /// Found another organization and return its Admin.
    pub async fn other_organization(&self, name: &str) -> (Organization, User) {
        let username = format!("{}-founder", name.to_lowercase());
        self.users
            .create_organization(
                name,
                None,
                NewUser::new(
                    username.clone(),
                    format!("{}@{}.test", username, name.to_lowercase()),
                    "Other",
                    "Founder",
                    UserRole::Admin,
                ),
                PASSWORD,
            )
            .await
            .expect("founding other organization")
    }

    /// Current time on the fixture clock.
    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Subscribe to notices delivered from now on.
    pub async fn notices(&self) -> NoticeSubscription {
        self.notifier.subscribe().await
    }
}

pub fn new_user(username: &str, role: UserRole) -> NewUser {
    NewUser::new(
        username,
        format!("{}@acme.test", username),
        capitalize(username),
        "Tester",
        role,
    )
}

pub fn invite_request(email: &str, role: UserRole) -> InviteRequest {
    InviteRequest::new(email, "Invited", "Person", role)
}

/// Wait briefly for the next notice.
pub async fn next_notice(sub: &mut NoticeSubscription) -> Option<InvitationNotice> {
    tokio::time::timeout(Duration::from_millis(500), sub.recv())
        .await
        .ok()
        .and_then(|r| r.ok())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
