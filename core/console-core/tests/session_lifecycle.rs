use blog_console_protocol::UserIdentity;
use console_core::session::{AUTH_INITIALIZED_KEY, REDIRECTING_KEY, TOKEN_KEY};
use console_core::testing::{RecordingNavigator, ScriptedTransport};
use console_core::{
    ApiClient, Console, ConsoleConfig, CoordinatorAction, Decision, HttpResponse, JsonFileStore,
    KeyValueStore, LoginForm, Route, RouteDecision, Session, SessionPort,
};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const DELAY: Duration = Duration::from_millis(20);

/// One "tab": stores on disk, everything else rebuilt per reload.
struct Tab {
    console: Console,
    transport: Arc<ScriptedTransport>,
    navigator: Arc<RecordingNavigator>,
}

fn open_tab(root: &Path, scope: &str) -> Tab {
    open_tab_with(root, scope, None)
}

fn open_tab_with(root: &Path, scope: &str, max_identity_retries: Option<u32>) -> Tab {
    let credentials = Arc::new(JsonFileStore::new(root.join("credentials.json")));
    let tab_store = Arc::new(JsonFileStore::new(
        root.join("tabs").join(format!("{}.json", scope)),
    ));
    let session = Arc::new(Session::new(credentials, tab_store));
    let transport = Arc::new(ScriptedTransport::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let config = ConsoleConfig {
        identity_retry_delay_ms: DELAY.as_millis() as u64,
        max_identity_retries,
        ..ConsoleConfig::default()
    };
    let console = Console::with_parts(config, session, transport.clone(), navigator.clone());
    Tab {
        console,
        transport,
        navigator,
    }
}

fn me() -> serde_json::Value {
    json!({"userId": 1, "username": "admin", "role": "ROLE_ADMIN"})
}

fn seed_token(root: &Path, token: &str) {
    JsonFileStore::new(root.join("credentials.json"))
        .set(TOKEN_KEY, token)
        .unwrap();
}

#[test]
fn login_populates_session_without_identity_fetch() {
    let home = TempDir::new().unwrap();
    let tab = open_tab(home.path(), "a");
    tab.transport.push_json(
        200,
        json!({"token": "abc.def", "userId": 1, "username": "admin", "role": "ROLE_ADMIN"}),
    );

    tab.console
        .login(&LoginForm::new("admin", "secret"))
        .unwrap();

    let snapshot = tab.console.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.identity.unwrap().username, "admin");
    assert_eq!(
        JsonFileStore::new(home.path().join("credentials.json"))
            .get(TOKEN_KEY)
            .as_deref(),
        Some("abc.def")
    );

    // Nothing left for the coordinator to do.
    assert_eq!(
        tab.console.sync(Instant::now()),
        CoordinatorAction::Idle(Decision::Authenticated)
    );
    assert_eq!(tab.transport.paths(), vec!["POST /api/auth/signin"]);
}

#[test]
fn reload_with_stored_token_fetches_identity_exactly_once() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "abc.def");
    let tab = open_tab(home.path(), "a");
    tab.transport.push_json(200, me());

    let snapshot = tab.console.settle();
    assert!(snapshot.is_authenticated());

    for _ in 0..3 {
        tab.console.sync(Instant::now());
    }
    assert_eq!(tab.transport.paths(), vec!["GET /api/auth/me"]);
}

#[test]
fn rejected_identity_fetch_clears_and_redirects_once() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "expired");
    let tab = open_tab(home.path(), "a");
    tab.transport.push_status(401);

    let snapshot = tab.console.settle();

    assert!(!snapshot.token_present);
    assert!(snapshot.identity.is_none());
    assert!(!snapshot.attempt_started);
    assert!(snapshot.redirecting);
    assert_eq!(tab.navigator.hard_redirects(), vec![Route::Login]);
    assert_eq!(tab.transport.paths(), vec!["GET /api/auth/me"]);
}

#[test]
fn interrupted_fetch_is_retried_after_delay_on_reload() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "abc.def");

    // First load starts a fetch and is torn down before it completes.
    {
        let tab = open_tab(home.path(), "a");
        let now = Instant::now();
        let mut coordinator = console_core::SessionCoordinator::new(DELAY, None);
        assert_eq!(
            coordinator.evaluate(tab.console.session(), now),
            CoordinatorAction::FetchIdentity
        );
        assert!(tab.console.session().attempt_started());
    }

    // Reload: same tab scope, flag still set, nothing in flight.
    let tab = open_tab(home.path(), "a");
    let now = Instant::now();
    let pending = match tab.console.sync(now) {
        CoordinatorAction::RetryScheduled(pending) => pending,
        other => panic!("expected a scheduled retry, got {:?}", other),
    };
    assert!(tab.transport.requests().is_empty());
    assert!(!tab.console.tick(now));

    tab.transport.push_json(200, me());
    assert!(tab.console.tick(pending.due_at));
    assert!(tab.console.snapshot().is_authenticated());
    assert_eq!(tab.transport.paths(), vec!["GET /api/auth/me"]);
}

#[test]
fn retry_bound_holds_across_reloads() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "abc.def");

    // First load starts a fetch and dies mid-flight.
    {
        let tab = open_tab_with(home.path(), "a", Some(1));
        let mut coordinator = console_core::SessionCoordinator::new(DELAY, Some(1));
        assert_eq!(
            coordinator.evaluate(tab.console.session(), Instant::now()),
            CoordinatorAction::FetchIdentity
        );
    }

    // Second load takes the damped retry, which dies mid-flight too.
    {
        let tab = open_tab_with(home.path(), "a", Some(1));
        let mut coordinator = console_core::SessionCoordinator::new(DELAY, Some(1));
        let session = tab.console.session();
        let pending = match coordinator.evaluate(session, Instant::now()) {
            CoordinatorAction::RetryScheduled(pending) => pending,
            other => panic!("expected a scheduled retry, got {:?}", other),
        };
        assert_eq!(
            coordinator.poll(session, pending.due_at),
            Some(CoordinatorAction::FetchIdentity)
        );
        assert_eq!(session.identity_retries(), 1);
    }

    // Third load is out of retries.
    let tab = open_tab_with(home.path(), "a", Some(1));
    assert_eq!(tab.console.sync(Instant::now()), CoordinatorAction::GaveUp);
    assert!(tab.transport.requests().is_empty());
    let snapshot = tab.console.snapshot();
    assert!(!snapshot.token_present);
    assert!(!snapshot.attempt_started);
    assert_eq!(tab.console.session().identity_retries(), 0);
    assert_eq!(
        tab.console.guard(&Route::Blogs),
        RouteDecision::RedirectToLogin { from: Route::Blogs }
    );
}

#[test]
fn other_tabs_do_not_inherit_the_attempt_flag() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "abc.def");
    JsonFileStore::new(home.path().join("tabs").join("a.json"))
        .set(AUTH_INITIALIZED_KEY, "true")
        .unwrap();

    let tab = open_tab(home.path(), "b");
    tab.transport.push_json(200, me());

    assert_eq!(
        tab.console.sync(Instant::now()),
        CoordinatorAction::FetchIdentity
    );
    assert!(tab.console.snapshot().is_authenticated());
}

#[test]
fn concurrent_unauthorized_responses_redirect_once() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "expired");
    let credentials = Arc::new(JsonFileStore::new(home.path().join("credentials.json")));
    let tab_store = Arc::new(JsonFileStore::new(home.path().join("tabs").join("a.json")));
    let session = Arc::new(Session::new(credentials, tab_store));
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_fallback(HttpResponse::new(401, Vec::new()));
    let navigator = Arc::new(RecordingNavigator::new());
    let client = ApiClient::new(transport.clone(), session.clone(), navigator.clone());

    let barrier = Arc::new(Barrier::new(3));
    let handles: Vec<_> = ["/api/blogs", "/api/auth/users", "/api/auth/me"]
        .into_iter()
        .map(|path| {
            let client = client.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                client.get_json::<serde_json::Value>(path)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(result.unwrap_err().is_unauthorized());
    }

    assert_eq!(navigator.hard_redirects(), vec![Route::Login]);
    assert!(!session.token_present());
    assert!(session.redirecting());
}

#[test]
fn redirect_guard_survives_reload_until_login() {
    let home = TempDir::new().unwrap();
    JsonFileStore::new(home.path().join("tabs").join("a.json"))
        .set(REDIRECTING_KEY, "true")
        .unwrap();

    let tab = open_tab(home.path(), "a");
    assert!(tab.console.snapshot().redirecting);

    tab.transport.push_json(
        200,
        json!({"token": "fresh", "userId": 1, "username": "admin", "role": "ROLE_ADMIN"}),
    );
    tab.console
        .login(&LoginForm::new("admin", "secret"))
        .unwrap();
    assert!(!tab.console.snapshot().redirecting);
}

#[test]
fn clearing_an_empty_session_changes_nothing() {
    let home = TempDir::new().unwrap();
    let tab = open_tab(home.path(), "a");
    let before = tab.console.snapshot();

    assert!(!tab.console.session().clear_session());
    tab.console.sync(Instant::now());

    assert_eq!(tab.console.snapshot(), before);
    assert!(tab.navigator.events().is_empty());
}

#[test]
fn identity_never_outlives_the_token() {
    let home = TempDir::new().unwrap();
    let tab = open_tab(home.path(), "a");
    let session = tab.console.session();
    let user = UserIdentity {
        user_id: 1,
        username: "admin".to_string(),
        role: "ROLE_ADMIN".to_string(),
        full_name: None,
        phone_number: None,
        created_at: None,
    };
    let check = |label: &str| {
        let snapshot = session.snapshot();
        assert!(
            snapshot.identity.is_none() || snapshot.token_present,
            "identity without token after {}",
            label
        );
    };

    session.set_identity(user.clone());
    check("set_identity without token");
    session.complete_identity_fetch(user.clone());
    check("late fetch result");
    session.establish("abc.def", user.clone()).unwrap();
    check("establish");
    session.clear_session();
    check("clear_session");
    session.complete_identity_fetch(user.clone());
    check("fetch completing after clear");
    session.establish("abc.def", user.clone()).unwrap();
    JsonFileStore::new(home.path().join("credentials.json"))
        .remove(TOKEN_KEY)
        .unwrap();
    check("token removed by another process");
    session.fail_identity_fetch("Failed to get user data");
    check("failed fetch");
}

#[test]
fn logout_is_an_in_app_transition() {
    let home = TempDir::new().unwrap();
    let tab = open_tab(home.path(), "a");
    tab.transport.push_json(
        200,
        json!({"token": "abc.def", "userId": 1, "username": "admin", "role": "ROLE_ADMIN"}),
    );
    tab.console
        .login(&LoginForm::new("admin", "secret"))
        .unwrap();
    tab.transport.push_status(200);

    tab.console.logout();

    let snapshot = tab.console.snapshot();
    assert!(!snapshot.token_present);
    assert!(!snapshot.redirecting);
    assert_eq!(tab.navigator.navigations(), vec![Route::Login]);
    assert!(tab.navigator.hard_redirects().is_empty());
    assert_eq!(
        tab.transport.paths(),
        vec!["POST /api/auth/signin", "POST /api/auth/signout"]
    );
}

#[test]
fn logout_with_expired_token_never_arms_the_guard() {
    let home = TempDir::new().unwrap();
    seed_token(home.path(), "expired");
    let tab = open_tab(home.path(), "a");
    tab.transport.push_status(401);

    tab.console.logout();

    let snapshot = tab.console.snapshot();
    assert!(!snapshot.token_present);
    assert!(!snapshot.redirecting);
    assert!(tab.navigator.hard_redirects().is_empty());
    assert_eq!(tab.navigator.navigations(), vec![Route::Login]);

    // Reload: nothing left behind in the tab.
    let reloaded = open_tab(home.path(), "a");
    assert!(!reloaded.console.snapshot().redirecting);
}
