//! Console - the entry point that wires session, coordinator, and API client.
//!
//! The console is synchronous. Callers drive it with explicit instants:
//! `sync(now)` runs one coordinator cycle, `tick(now)` fires a due retry, and
//! `settle()` loops over both until the session reaches a resting state.
//!
//! ```rust,ignore
//! use console_core::{Console, StorageConfig};
//!
//! let console = Console::open(&StorageConfig::new()?, "tab-1", navigator)?;
//! let snapshot = console.settle();
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use blog_console_protocol::{ProfileUpdate, UserIdentity};
use tracing::{debug, info};

use crate::auth;
use crate::blogs::BlogService;
use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::navigation::{guard, Navigator, Route, RouteDecision};
use crate::session::{
    CoordinatorAction, Decision, JsonFileStore, KeyValueStore, Session, SessionCoordinator,
    SessionSnapshot,
};
use crate::storage::StorageConfig;
use crate::transport::{ReqwestTransport, Transport};
use crate::users::UserService;
use crate::validation::LoginForm;

/// Upper bound on drive-loop iterations in `settle`.
const MAX_SETTLE_CYCLES: usize = 8;
const IN_FLIGHT_POLL: Duration = Duration::from_millis(50);

pub struct Console {
    config: ConsoleConfig,
    session: Arc<Session>,
    client: ApiClient,
    coordinator: Mutex<SessionCoordinator>,
    navigator: Arc<dyn Navigator>,
}

impl Console {
    /// Opens the console against on-disk stores for one tab scope.
    pub fn open(
        storage: &StorageConfig,
        scope: &str,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let config = ConsoleConfig::load(&storage.config_file())?;
        let credentials: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::new(storage.credentials_file()));
        let tab: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(storage.tab_file(scope)));
        let transport = Arc::new(ReqwestTransport::new(
            &config.base_url,
            config.request_timeout(),
        )?);
        debug!(base_url = %config.base_url, scope, "Opening console");
        Ok(Self::with_parts(
            config,
            Arc::new(Session::new(credentials, tab)),
            transport,
            navigator,
        ))
    }

    /// Builds a console from explicit parts. Used by tests.
    pub fn with_parts(
        config: ConsoleConfig,
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let client = ApiClient::new(transport, session.clone(), navigator.clone());
        let coordinator =
            SessionCoordinator::new(config.identity_retry_delay(), config.max_identity_retries);
        Self {
            config,
            session,
            client,
            coordinator: Mutex::new(coordinator),
            navigator,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    fn lock_coordinator(&self) -> MutexGuard<'_, SessionCoordinator> {
        self.coordinator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    /// One coordinator cycle. Runs the identity fetch when one is due.
    pub fn sync(&self, now: Instant) -> CoordinatorAction {
        let action = {
            let mut coordinator = self.lock_coordinator();
            let action = coordinator.evaluate(&self.session, now);
            if action == CoordinatorAction::FetchIdentity {
                // Visible as in flight before the lock is released.
                self.session.begin_loading();
            }
            action
        };
        if action == CoordinatorAction::FetchIdentity {
            self.run_identity_fetch();
        }
        action
    }

    /// Fires the scheduled retry if it is due. Returns whether a fetch ran.
    pub fn tick(&self, now: Instant) -> bool {
        let fired = {
            let mut coordinator = self.lock_coordinator();
            let fired = coordinator.poll(&self.session, now) == Some(CoordinatorAction::FetchIdentity);
            if fired {
                self.session.begin_loading();
            }
            fired
        };
        if fired {
            self.run_identity_fetch();
        }
        fired
    }

    fn run_identity_fetch(&self) {
        if let Err(err) = auth::fetch_identity(&self.client, &self.session) {
            debug!(error = %err, "Identity fetch ended without a user");
        }
    }

    /// Drives sync and tick until the session rests: authenticated,
    /// unauthenticated, or out of retries. Sleeps until a scheduled retry is
    /// due.
    pub fn settle(&self) -> SessionSnapshot {
        for cycle in 0..MAX_SETTLE_CYCLES {
            let action = self.sync(Instant::now());
            debug!(cycle, ?action, "Settle cycle");
            match action {
                CoordinatorAction::Idle(Decision::Authenticated)
                | CoordinatorAction::Idle(Decision::Unauthenticated)
                | CoordinatorAction::GaveUp => break,
                CoordinatorAction::Idle(_) => thread::sleep(IN_FLIGHT_POLL),
                CoordinatorAction::FetchIdentity => {}
                CoordinatorAction::RetryScheduled(pending)
                | CoordinatorAction::RetryPending(pending) => {
                    let wait = pending.due_at.saturating_duration_since(Instant::now());
                    thread::sleep(wait);
                    self.tick(Instant::now());
                }
            }
        }
        self.session.snapshot()
    }

    /// Cancels any scheduled retry.
    pub fn unmount(&self) {
        self.lock_coordinator().cancel_retry();
    }

    pub fn guard(&self, route: &Route) -> RouteDecision {
        guard(route, &self.session.snapshot())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Auth actions
    // ─────────────────────────────────────────────────────────────────────────────

    /// A failed login leaves any scheduled retry in place.
    pub fn login(&self, form: &LoginForm) -> Result<UserIdentity> {
        let identity = auth::login(&self.client, &self.session, form)?;
        self.lock_coordinator().cancel_retry();
        info!(user_id = identity.user_id, "Console session started");
        Ok(identity)
    }

    pub fn logout(&self) {
        self.lock_coordinator().cancel_retry();
        auth::logout(&self.client, &self.session, self.navigator.as_ref());
    }

    pub fn fetch_identity(&self) -> Result<UserIdentity> {
        auth::fetch_identity(&self.client, &self.session)
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<UserIdentity> {
        auth::update_profile(&self.client, &self.session, update)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn blogs(&self) -> BlogService<'_> {
        BlogService::new(&self.client)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.client)
    }
}
