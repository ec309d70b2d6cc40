//! Storage configuration and path management for the console.
//!
//! All file paths the console touches are decided here:
//!
//! - Durable credentials (`credentials.json`), shared by every terminal
//! - Tab-scoped session markers (`tabs/<scope>.json`), one file per shell
//! - Configuration (`config.toml`) and logs (`logs/`)
//!
//! Production code uses `StorageConfig::new()` which points to `~/.blog-console/`.
//! Tests use `StorageConfig::with_root(temp_dir)` for isolation.

use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, Result};

const ROOT_DIR_NAME: &str = ".blog-console";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConsoleError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(ROOT_DIR_NAME),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Durable key/value file holding the bearer token.
    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Tab-scoped key/value file for one terminal session.
    pub fn tab_file(&self, scope: &str) -> PathBuf {
        self.tabs_dir().join(format!("{}.json", sanitize_scope(scope)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn tabs_dir(&self) -> PathBuf {
        self.root.join("tabs")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Keeps scope identifiers to a safe file-name alphabet.
fn sanitize_scope(scope: &str) -> String {
    let cleaned: String = scope
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
