//! Session coordinator: decides when to fetch identity.
//!
//! Evaluated on mount and whenever token presence, identity presence, or the
//! loading flag changes.
//!
//! ```text
//! token? ──no──────────────────────────────────────────► Unauthenticated
//!   │yes
//! identity? ──yes──────────────────────────────────────► Authenticated
//!   │no
//! loading? ──yes───────────────────────────────────────► FetchInFlight
//!   │no
//! attempt flag? ──no──► set flag, fetch now ───────────► FetchNow
//!   │yes
//!   └──► clear flag, fetch once after fixed delay ─────► ScheduleRetry
//! ```
//!
//! The flag being set with no identity and nothing loading means an earlier
//! attempt in this tab ended without producing identity (typically the
//! process went away mid-fetch). The damped retry breaks tight loops while
//! still making progress.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::state::{Session, SessionPort, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorInputs {
    pub token_present: bool,
    pub identity_present: bool,
    pub is_loading: bool,
    pub attempt_started: bool,
}

impl From<&SessionSnapshot> for CoordinatorInputs {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            token_present: snapshot.token_present,
            identity_present: snapshot.identity.is_some(),
            is_loading: snapshot.is_loading,
            attempt_started: snapshot.attempt_started,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Unauthenticated,
    Authenticated,
    FetchInFlight,
    FetchNow,
    ScheduleRetry,
}

pub fn decide(inputs: CoordinatorInputs) -> Decision {
    if !inputs.token_present {
        return Decision::Unauthenticated;
    }
    if inputs.identity_present {
        return Decision::Authenticated;
    }
    if inputs.is_loading {
        return Decision::FetchInFlight;
    }
    if inputs.attempt_started {
        Decision::ScheduleRetry
    } else {
        Decision::FetchNow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRetry {
    pub due_at: Instant,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Nothing to do for this decision.
    Idle(Decision),
    /// The caller must run exactly one identity fetch now.
    FetchIdentity,
    RetryScheduled(PendingRetry),
    /// A scheduled retry already covers this state.
    RetryPending(PendingRetry),
    /// Retry bound exhausted; the session was dropped.
    GaveUp,
}

#[derive(Debug)]
pub struct SessionCoordinator {
    retry_delay: Duration,
    max_retries: Option<u32>,
    pending: Option<PendingRetry>,
    generation: u64,
}

impl SessionCoordinator {
    pub fn new(retry_delay: Duration, max_retries: Option<u32>) -> Self {
        Self {
            retry_delay,
            max_retries,
            pending: None,
            generation: 0,
        }
    }

    pub fn pending_retry(&self) -> Option<PendingRetry> {
        self.pending
    }

    /// One decision cycle. Applies the flag side effects of rules 4 and 5.
    pub fn evaluate(&mut self, session: &Session, now: Instant) -> CoordinatorAction {
        let snapshot = session.snapshot();
        let decision = decide(CoordinatorInputs::from(&snapshot));
        debug!(?decision, pending = self.pending.is_some(), "Coordinator decision");

        match decision {
            Decision::Unauthenticated | Decision::Authenticated => {
                self.cancel_retry();
                CoordinatorAction::Idle(decision)
            }
            Decision::FetchInFlight => CoordinatorAction::Idle(decision),
            Decision::FetchNow => {
                if let Some(pending) = self.pending {
                    return CoordinatorAction::RetryPending(pending);
                }
                session.mark_attempt_started();
                info!("Token present without identity; fetching current user");
                CoordinatorAction::FetchIdentity
            }
            Decision::ScheduleRetry => {
                if let Some(pending) = self.pending {
                    return CoordinatorAction::RetryPending(pending);
                }
                // The count is tab-scoped, so the bound holds across reloads.
                let retries = session.identity_retries();
                if self.max_retries.map(|max| retries >= max).unwrap_or(false) {
                    warn!(retries, "Identity retry bound exhausted; dropping session");
                    session.clear_session();
                    return CoordinatorAction::GaveUp;
                }

                session.clear_attempt();
                session.record_identity_retry();
                self.generation += 1;
                let pending = PendingRetry {
                    due_at: now + self.retry_delay,
                    generation: self.generation,
                };
                self.pending = Some(pending);
                info!(
                    generation = pending.generation,
                    delay_ms = self.retry_delay.as_millis() as u64,
                    "Earlier identity attempt left no user; retry scheduled"
                );
                CoordinatorAction::RetryScheduled(pending)
            }
        }
    }

    /// Fires the scheduled retry once its deadline has passed.
    ///
    /// Returns `FetchIdentity` when the caller must fetch. A retry whose
    /// premise no longer holds (token gone, identity present, fetch running)
    /// is discarded.
    pub fn poll(&mut self, session: &Session, now: Instant) -> Option<CoordinatorAction> {
        let pending = self.pending?;
        if now < pending.due_at {
            return None;
        }
        self.pending = None;

        let inputs = CoordinatorInputs::from(&session.snapshot());
        if !inputs.token_present || inputs.identity_present || inputs.is_loading {
            debug!(generation = pending.generation, "Discarding stale identity retry");
            return None;
        }

        session.mark_attempt_started();
        info!(generation = pending.generation, "Retrying identity fetch");
        Some(CoordinatorAction::FetchIdentity)
    }

    /// Cancels any scheduled retry (fresh login, logout, unmount).
    pub fn cancel_retry(&mut self) -> Option<PendingRetry> {
        let cancelled = self.pending.take();
        if let Some(pending) = cancelled {
            debug!(generation = pending.generation, "Cancelled identity retry");
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::{KeyValueStore, MemoryStore, TOKEN_KEY};
    use blog_console_protocol::UserIdentity;
    use std::sync::Arc;

    const DELAY: Duration = Duration::from_millis(1000);

    fn inputs(token: bool, identity: bool, loading: bool, attempt: bool) -> CoordinatorInputs {
        CoordinatorInputs {
            token_present: token,
            identity_present: identity,
            is_loading: loading,
            attempt_started: attempt,
        }
    }

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

    fn session_with_token() -> Session {
        let credentials = Arc::new(MemoryStore::new());
        credentials.set(TOKEN_KEY, "abc.def").unwrap();
        Session::new(credentials, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn decide_covers_every_rule() {
        assert_eq!(decide(inputs(false, false, false, true)), Decision::Unauthenticated);
        assert_eq!(decide(inputs(true, true, false, false)), Decision::Authenticated);
        assert_eq!(decide(inputs(true, false, true, true)), Decision::FetchInFlight);
        assert_eq!(decide(inputs(true, false, false, false)), Decision::FetchNow);
        assert_eq!(decide(inputs(true, false, false, true)), Decision::ScheduleRetry);
    }

    #[test]
    fn first_evaluation_sets_flag_and_fetches() {
        let session = session_with_token();
        let mut coordinator = SessionCoordinator::new(DELAY, None);

        let action = coordinator.evaluate(&session, Instant::now());

        assert_eq!(action, CoordinatorAction::FetchIdentity);
        assert!(session.attempt_started());
    }

    #[test]
    fn no_second_fetch_while_loading() {
        let session = session_with_token();
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        let now = Instant::now();

        assert_eq!(coordinator.evaluate(&session, now), CoordinatorAction::FetchIdentity);
        session.begin_loading();

        assert_eq!(
            coordinator.evaluate(&session, now),
            CoordinatorAction::Idle(Decision::FetchInFlight)
        );
        assert_eq!(
            coordinator.evaluate(&session, now),
            CoordinatorAction::Idle(Decision::FetchInFlight)
        );
    }

    #[test]
    fn stale_flag_schedules_one_delayed_retry() {
        let session = session_with_token();
        session.mark_attempt_started();
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        let now = Instant::now();

        let action = coordinator.evaluate(&session, now);
        let pending = match action {
            CoordinatorAction::RetryScheduled(pending) => pending,
            other => panic!("expected retry, got {:?}", other),
        };
        assert_eq!(pending.due_at, now + DELAY);
        assert!(!session.attempt_started());

        // Flag is now clear, but the pending retry must suppress an immediate fetch.
        assert_eq!(
            coordinator.evaluate(&session, now),
            CoordinatorAction::RetryPending(pending)
        );
        assert_eq!(session.identity_retries(), 1);
    }

    #[test]
    fn retry_fires_only_after_deadline_and_sets_flag() {
        let session = session_with_token();
        session.mark_attempt_started();
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        let now = Instant::now();
        coordinator.evaluate(&session, now);

        assert_eq!(coordinator.poll(&session, now + Duration::from_millis(999)), None);
        assert_eq!(
            coordinator.poll(&session, now + DELAY),
            Some(CoordinatorAction::FetchIdentity)
        );
        assert!(session.attempt_started());
        assert_eq!(coordinator.poll(&session, now + DELAY * 2), None);
    }

    #[test]
    fn cancelled_retry_never_fires() {
        let session = session_with_token();
        session.mark_attempt_started();
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        let now = Instant::now();
        coordinator.evaluate(&session, now);

        assert!(coordinator.cancel_retry().is_some());
        assert_eq!(coordinator.poll(&session, now + DELAY), None);
    }

    #[test]
    fn retry_discarded_when_identity_arrived() {
        let session = session_with_token();
        session.mark_attempt_started();
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        let now = Instant::now();
        coordinator.evaluate(&session, now);

        assert!(session.set_identity(identity()));
        assert_eq!(coordinator.poll(&session, now + DELAY), None);
        assert!(coordinator.pending_retry().is_none());
    }

    #[test]
    fn authenticated_and_unauthenticated_are_idle() {
        let session = session_with_token();
        session.set_identity(identity());
        let mut coordinator = SessionCoordinator::new(DELAY, None);
        assert_eq!(
            coordinator.evaluate(&session, Instant::now()),
            CoordinatorAction::Idle(Decision::Authenticated)
        );

        session.clear_session();
        assert_eq!(
            coordinator.evaluate(&session, Instant::now()),
            CoordinatorAction::Idle(Decision::Unauthenticated)
        );
    }

    #[test]
    fn bounded_retries_drop_the_session() {
        let session = session_with_token();
        let mut coordinator = SessionCoordinator::new(DELAY, Some(1));
        let mut now = Instant::now();

        session.mark_attempt_started();
        assert!(matches!(
            coordinator.evaluate(&session, now),
            CoordinatorAction::RetryScheduled(_)
        ));
        now += DELAY;
        assert_eq!(
            coordinator.poll(&session, now),
            Some(CoordinatorAction::FetchIdentity)
        );

        // The retry ended without identity and without clearing the flag.
        assert_eq!(coordinator.evaluate(&session, now), CoordinatorAction::GaveUp);
        assert!(!session.token_present());
        assert!(!session.attempt_started());
        assert_eq!(session.identity_retries(), 0);
    }
}
