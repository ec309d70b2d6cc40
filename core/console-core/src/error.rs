//! Error types for console-core operations.

use std::path::PathBuf;

use crate::validation::ValidationError;

/// All errors that can occur in console-core operations.
///
/// `Unauthorized` is the only variant with a global side effect (credential
/// clear and redirect, handled by the API client). Everything else is local to
/// the action that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    // ─────────────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Unauthorized: {path}")]
    Unauthorized { path: String },

    #[error("Request to {path} failed with status {status}: {message}")]
    Http {
        path: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {context}: {details}")]
    Network { context: String, details: String },

    #[error("Response decoding failed: {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Signin response did not include a token")]
    MissingToken,

    // ─────────────────────────────────────────────────────────────────────
    // Client-side Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    // ─────────────────────────────────────────────────────────────────────
    // Local Storage / Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConsoleError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Unauthorized { .. } => Some(401),
            ConsoleError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ConsoleError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using ConsoleError.
pub type Result<T> = std::result::Result<T, ConsoleError>;

impl From<ConsoleError> for String {
    fn from(err: ConsoleError) -> String {
        err.to_string()
    }
}
