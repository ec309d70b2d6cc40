//! Command implementations.
//!
//! Every command returns `Result<String, CliError>`: the text to print on
//! success, or a failure that `main` renders as an error notice.

pub mod blogs;
pub mod session;
pub mod users;

use std::io;
use std::path::Path;
use std::sync::Arc;

use console_core::{
    Console, ConsoleError, Notice, Route, RouteDecision, StorageConfig,
};
use tracing::debug;

use crate::tab::TerminalNavigator;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{}", .0.message)]
    Notice(Notice),

    #[error("Not logged in. Run `blog-console login --next {from}` to continue.")]
    NotLoggedIn { from: Route },

    #[error("Only administrators can manage users")]
    Forbidden,

    #[error("Failed to read {what}: {source}")]
    Input {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Console(#[from] ConsoleError),
}

impl CliError {
    /// Converts an action failure into a notice with the action's fallback
    /// message. Unauthorized errors already triggered the redirect path.
    pub fn action(err: ConsoleError, fallback: &str) -> Self {
        if err.is_unauthorized() {
            return CliError::Console(err);
        }
        CliError::Notice(Notice::failure(&err, fallback))
    }

    /// Whether the navigator already told the user to log in again.
    pub fn already_reported(&self, redirected: bool) -> bool {
        let session_loss = match self {
            CliError::Console(inner) => inner.is_unauthorized(),
            CliError::NotLoggedIn { .. } => true,
            _ => false,
        };
        session_loss && redirected
    }
}

pub type CommandResult = Result<String, CliError>;

/// Everything a command needs to build a console for this invocation.
pub struct Context {
    pub storage: StorageConfig,
    pub scope: String,
    pub navigator: Arc<TerminalNavigator>,
    pub json: bool,
}

impl Context {
    pub fn open(&self) -> Result<Console, CliError> {
        Ok(Console::open(
            &self.storage,
            &self.scope,
            self.navigator.clone(),
        )?)
    }

    /// Opens the console for a private route: settles the session, then runs
    /// the route guard.
    pub fn open_protected(&self, route: Route) -> Result<Console, CliError> {
        let console = self.open()?;
        let snapshot = console.settle();
        debug!(
            route = %route,
            token_present = snapshot.token_present,
            identity = snapshot.identity.is_some(),
            "Guarding route"
        );
        match console.guard(&route) {
            RouteDecision::Render => Ok(console),
            RouteDecision::RedirectToLogin { from } => Err(CliError::NotLoggedIn { from }),
            RouteDecision::Forbidden => Err(CliError::Forbidden),
        }
    }

    pub fn render<T: serde::Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> String {
        if self.json {
            serde_json::to_string_pretty(value).unwrap_or_else(|err| {
                format!("{{\"error\": \"failed to encode output: {}\"}}", err)
            })
        } else {
            text()
        }
    }
}

pub fn read_text_file(path: &Path) -> Result<String, CliError> {
    fs_err::read_to_string(path).map_err(|source| CliError::Input {
        what: path.display().to_string(),
        source,
    })
}
