//! Session state: the single source of truth for token and identity.
//!
//! `Session` owns the credential store, the tab store, and the in-memory
//! [`AuthState`]. Every change to token or identity happens while holding the
//! state mutex, so no observer can see an identity without its token.

use std::sync::{Arc, Mutex, MutexGuard};

use blog_console_protocol::UserIdentity;
use tracing::{debug, info, warn};

use super::store::{
    KeyValueStore, AUTH_INITIALIZED_KEY, IDENTITY_RETRIES_KEY, REDIRECTING_KEY, TOKEN_KEY,
};
use crate::error::Result;

const FLAG_SET: &str = "true";

/// Narrow interface shared by the API client and the coordinator.
pub trait SessionPort: Send + Sync {
    fn current_token(&self) -> Option<String>;

    /// Clears token, identity, and the session attempt flag in one step.
    /// Returns whether anything was cleared. Never redirects.
    fn clear_session(&self) -> bool;

    /// Stores identity. Refused (returns false) when no token is present.
    fn set_identity(&self, identity: UserIdentity) -> bool;

    /// Arms the redirect guard. Returns true only for the caller that armed it.
    fn begin_redirect(&self) -> bool;
}

/// In-memory authentication state. Identity is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub identity: Option<UserIdentity>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Consistent read of everything views and the coordinator look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token_present: bool,
    pub identity: Option<UserIdentity>,
    pub is_loading: bool,
    pub attempt_started: bool,
    pub redirecting: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token_present && self.identity.is_some()
    }
}

pub struct Session {
    credentials: Arc<dyn KeyValueStore>,
    tab: Arc<dyn KeyValueStore>,
    state: Mutex<AuthState>,
}

impl Session {
    pub fn new(credentials: Arc<dyn KeyValueStore>, tab: Arc<dyn KeyValueStore>) -> Self {
        Self {
            credentials,
            tab,
            state: Mutex::new(AuthState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        let token_present = self.credentials.get(TOKEN_KEY).is_some();
        SessionSnapshot {
            token_present,
            // A token cleared by another process drops identity for this view too.
            identity: if token_present {
                state.identity.clone()
            } else {
                None
            },
            is_loading: state.is_loading,
            attempt_started: self.flag(AUTH_INITIALIZED_KEY),
            redirecting: self.flag(REDIRECTING_KEY),
            error: state.error.clone(),
        }
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.snapshot().identity
    }

    pub fn token_present(&self) -> bool {
        self.credentials.get(TOKEN_KEY).is_some()
    }

    /// Login: token and identity become visible together.
    pub fn establish(&self, token: &str, identity: UserIdentity) -> Result<()> {
        let mut state = self.lock_state();
        self.credentials.set(TOKEN_KEY, token)?;
        info!(
            user_id = identity.user_id,
            username = %identity.username,
            "Session established"
        );
        state.identity = Some(identity);
        state.is_loading = false;
        state.error = None;
        self.clear_flag(AUTH_INITIALIZED_KEY);
        self.clear_flag(REDIRECTING_KEY);
        self.clear_flag(IDENTITY_RETRIES_KEY);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Loading / error slot
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn begin_loading(&self) {
        let mut state = self.lock_state();
        state.is_loading = true;
        state.error = None;
    }

    /// Ends a failed action: records the message, mutates nothing else.
    pub fn fail_loading(&self, message: impl Into<String>) {
        let mut state = self.lock_state();
        state.is_loading = false;
        state.error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    /// Identity fetch failure: drop the session and remember why.
    pub fn fail_identity_fetch(&self, message: impl Into<String>) {
        let mut state = self.lock_state();
        self.clear_locked(&mut state);
        state.is_loading = false;
        state.error = Some(message.into());
    }

    /// Identity fetch success. The attempt flag is cleared so the next reload
    /// starts with an immediate fetch instead of the damped retry path.
    pub fn complete_identity_fetch(&self, identity: UserIdentity) -> bool {
        let mut state = self.lock_state();
        state.is_loading = false;
        if self.credentials.get(TOKEN_KEY).is_none() {
            warn!("Dropping identity that arrived after the token was cleared");
            return false;
        }
        state.identity = Some(identity);
        state.error = None;
        self.clear_flag(AUTH_INITIALIZED_KEY);
        self.clear_flag(IDENTITY_RETRIES_KEY);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tab-scoped flags
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn attempt_started(&self) -> bool {
        self.flag(AUTH_INITIALIZED_KEY)
    }

    pub fn mark_attempt_started(&self) {
        if let Err(err) = self.tab.set(AUTH_INITIALIZED_KEY, FLAG_SET) {
            warn!(error = %err, "Failed to persist session attempt flag");
        }
    }

    pub fn clear_attempt(&self) {
        self.clear_flag(AUTH_INITIALIZED_KEY);
    }

    /// Damped retries taken in this tab since identity was last known.
    pub fn identity_retries(&self) -> u32 {
        self.tab
            .get(IDENTITY_RETRIES_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    /// Counts one more damped retry and returns the new total.
    pub fn record_identity_retry(&self) -> u32 {
        let retries = self.identity_retries().saturating_add(1);
        if let Err(err) = self.tab.set(IDENTITY_RETRIES_KEY, &retries.to_string()) {
            warn!(error = %err, "Failed to persist identity retry count");
        }
        retries
    }

    pub fn redirecting(&self) -> bool {
        self.flag(REDIRECTING_KEY)
    }

    pub fn clear_redirect_guard(&self) {
        self.clear_flag(REDIRECTING_KEY);
    }

    fn flag(&self, key: &str) -> bool {
        self.tab.get(key).is_some()
    }

    fn clear_flag(&self, key: &str) {
        if let Err(err) = self.tab.remove(key) {
            warn!(key, error = %err, "Failed to clear tab-scoped flag");
        }
    }

    fn clear_locked(&self, state: &mut AuthState) -> bool {
        let had_token = self.credentials.get(TOKEN_KEY).is_some();
        let had_identity = state.identity.is_some();
        let had_attempt = self.flag(AUTH_INITIALIZED_KEY);

        // Identity first: a failed token removal must not leave it behind.
        state.identity = None;
        if had_token {
            if let Err(err) = self.credentials.remove(TOKEN_KEY) {
                warn!(error = %err, "Failed to remove stored token");
            }
        }
        if had_attempt {
            self.clear_flag(AUTH_INITIALIZED_KEY);
        }
        if self.flag(IDENTITY_RETRIES_KEY) {
            self.clear_flag(IDENTITY_RETRIES_KEY);
        }

        had_token || had_identity || had_attempt
    }
}

impl SessionPort for Session {
    fn current_token(&self) -> Option<String> {
        self.credentials.get(TOKEN_KEY)
    }

    fn clear_session(&self) -> bool {
        let mut state = self.lock_state();
        let changed = self.clear_locked(&mut state);
        if changed {
            info!("Session cleared");
        } else {
            debug!("Session already clear");
        }
        changed
    }

    fn set_identity(&self, identity: UserIdentity) -> bool {
        let mut state = self.lock_state();
        if self.credentials.get(TOKEN_KEY).is_none() {
            warn!("Refusing to store identity without a token");
            return false;
        }
        state.identity = Some(identity);
        true
    }

    fn begin_redirect(&self) -> bool {
        // Check-and-set under the state mutex so concurrent failures in this
        // process arm the guard exactly once.
        let _state = self.lock_state();
        if self.flag(REDIRECTING_KEY) {
            return false;
        }
        if let Err(err) = self.tab.set(REDIRECTING_KEY, FLAG_SET) {
            warn!(error = %err, "Failed to persist redirect guard");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemoryStore;

    fn identity() -> UserIdentity {
        UserIdentity {
            user_id: 1,
            username: "admin".to_string(),
            role: "ROLE_ADMIN".to_string(),
            full_name: None,
            phone_number: None,
            created_at: None,
        }
    }

    fn session() -> (Session, Arc<MemoryStore>, Arc<MemoryStore>) {
        let credentials = Arc::new(MemoryStore::new());
        let tab = Arc::new(MemoryStore::new());
        let session = Session::new(credentials.clone(), tab.clone());
        (session, credentials, tab)
    }

    #[test]
    fn clear_when_already_clear_is_a_no_op() {
        let (session, _, _) = session();
        let before = session.snapshot();
        assert!(!session.clear_session());
        assert_eq!(session.snapshot(), before);
        assert!(!session.redirecting());
    }

    #[test]
    fn establish_sets_token_and_identity_together() {
        let (session, credentials, tab) = session();
        tab.set(REDIRECTING_KEY, "true").unwrap();
        tab.set(AUTH_INITIALIZED_KEY, "true").unwrap();

        session.establish("abc.def", identity()).unwrap();

        assert_eq!(credentials.get(TOKEN_KEY).as_deref(), Some("abc.def"));
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.redirecting);
        assert!(!snapshot.attempt_started);
    }

    #[test]
    fn clear_session_drops_token_identity_and_flag() {
        let (session, credentials, _) = session();
        session.establish("abc.def", identity()).unwrap();
        session.mark_attempt_started();

        assert!(session.clear_session());

        assert_eq!(credentials.get(TOKEN_KEY), None);
        let snapshot = session.snapshot();
        assert!(snapshot.identity.is_none());
        assert!(!snapshot.attempt_started);
    }

    #[test]
    fn retry_count_lives_in_the_tab_store() {
        let (session, credentials, tab) = session();
        credentials.set(TOKEN_KEY, "abc.def").unwrap();

        assert_eq!(session.record_identity_retry(), 1);
        assert_eq!(session.record_identity_retry(), 2);
        assert_eq!(tab.get(IDENTITY_RETRIES_KEY).as_deref(), Some("2"));

        // A fresh view over the same tab store sees the count.
        let reloaded = Session::new(credentials.clone(), tab.clone());
        assert_eq!(reloaded.identity_retries(), 2);

        assert!(reloaded.complete_identity_fetch(identity()));
        assert_eq!(reloaded.identity_retries(), 0);

        session.record_identity_retry();
        session.clear_session();
        assert_eq!(session.identity_retries(), 0);
    }

    #[test]
    fn identity_is_refused_without_token() {
        let (session, _, _) = session();
        assert!(!session.set_identity(identity()));
        assert!(!session.complete_identity_fetch(identity()));
        assert!(session.snapshot().identity.is_none());
    }

    #[test]
    fn snapshot_hides_identity_when_token_removed_externally() {
        let (session, credentials, _) = session();
        session.establish("abc.def", identity()).unwrap();
        credentials.remove(TOKEN_KEY).unwrap();
        assert!(session.snapshot().identity.is_none());
    }

    #[test]
    fn redirect_guard_arms_once() {
        let (session, _, _) = session();
        assert!(session.begin_redirect());
        assert!(!session.begin_redirect());
        session.clear_redirect_guard();
        assert!(session.begin_redirect());
    }

    #[test]
    fn failed_login_records_error_only() {
        let (session, credentials, _) = session();
        session.begin_loading();
        session.fail_loading("Bad credentials");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some("Bad credentials"));
        assert!(!snapshot.is_loading);
        assert!(snapshot.identity.is_none());
        assert_eq!(credentials.get(TOKEN_KEY), None);
    }

    #[test]
    fn identity_fetch_failure_clears_everything() {
        let (session, credentials, _) = session();
        credentials.set(TOKEN_KEY, "abc.def").unwrap();
        session.mark_attempt_started();
        session.begin_loading();

        session.fail_identity_fetch("Failed to get user data");

        let snapshot = session.snapshot();
        assert!(!snapshot.token_present);
        assert!(!snapshot.attempt_started);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error.as_deref(), Some("Failed to get user data"));
    }
}
