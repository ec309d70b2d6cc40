//! Tab scope and terminal navigation.
//!
//! A "tab" is the shell the CLI runs in: every invocation from the same shell
//! shares one tab-scoped store. `BLOG_CONSOLE_TAB` overrides the scope.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use console_core::{Navigator, Route};
use tracing::{debug, info};

pub const TAB_ENV: &str = "BLOG_CONSOLE_TAB";

pub fn resolve_scope() -> String {
    scope_from(env::var(TAB_ENV).ok(), parent_pid())
}

fn scope_from(explicit: Option<String>, parent: u32) -> String {
    match explicit.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => value,
        _ => format!("shell-{}", parent),
    }
}

#[cfg(unix)]
fn parent_pid() -> u32 {
    // SAFETY: getppid has no preconditions and cannot fail.
    unsafe { libc::getppid() as u32 }
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    std::process::id()
}

/// Navigator for a terminal: routes are announced on stderr, and a hard
/// redirect marks the run as reset so the command stops using in-memory state.
#[derive(Default)]
pub struct TerminalNavigator {
    redirected: AtomicBool,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &Route) {
        debug!(route = %route, "Navigate");
    }

    fn hard_redirect(&self, route: &Route) {
        if !self.redirected.swap(true, Ordering::SeqCst) {
            info!(route = %route, "Hard redirect");
            eprintln!("Session expired. Log in again with `blog-console login`.");
        }
    }
}
