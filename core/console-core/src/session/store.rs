//! Key/value stores backing the session.
//!
//! Two instances are used at runtime:
//!
//! - the **credential store** (durable, shared by every terminal), holding
//!   only the bearer token under [`TOKEN_KEY`];
//! - the **tab store** (scoped to one shell), holding the session attempt flag
//!   and the redirect guard.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "values": { "token": "abc.def" }
//! }
//! ```
//!
//! `JsonFileStore` re-reads the file on every access so that separate
//! processes observe each other's writes. Empty, corrupt, or wrong-version
//! files read as empty. Writes go through a temp file + rename.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::error::{ConsoleError, Result};

pub const TOKEN_KEY: &str = "token";
pub const AUTH_INITIALIZED_KEY: &str = "authInitialized";
pub const REDIRECTING_KEY: &str = "redirecting";
pub const IDENTITY_RETRIES_KEY: &str = "identityRetries";

const STORE_VERSION: u32 = 1;

/// Minimal string key/value storage. Removing an absent key is a no-op.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    values: HashMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_VERSION,
            values: HashMap::new(),
        }
    }
}

/// File-backed store. The mutex serializes read-modify-write cycles within
/// one process.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the backing file. Used when a tab scope ends.
    pub fn destroy(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match fs_err::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ConsoleError::io("Failed to remove store file", err)),
        }
    }

    fn read_file(&self) -> StoreFile {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return StoreFile::default();
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read key/value store; treating as empty");
                return StoreFile::default();
            }
        };

        if content.trim().is_empty() {
            return StoreFile::default();
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => file,
            Ok(file) => {
                tracing::warn!(
                    path = %self.path.display(),
                    version = file.version,
                    "Unsupported key/value store version; treating as empty"
                );
                StoreFile::default()
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Corrupt key/value store; treating as empty"
                );
                StoreFile::default()
            }
        }
    }

    fn write_file(&self, file: &StoreFile) -> Result<()> {
        let parent_dir = self
            .path
            .parent()
            .ok_or_else(|| ConsoleError::io("Store path has no parent directory", not_found()))?;
        fs_err::create_dir_all(parent_dir)
            .map_err(|err| ConsoleError::io("Failed to create store directory", err))?;

        let content = serde_json::to_string_pretty(file).map_err(|err| ConsoleError::Decode {
            context: "Failed to serialize key/value store".to_string(),
            source: err,
        })?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|err| ConsoleError::io("Failed to create temp store file", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| ConsoleError::io("Failed to write temp store file", err))?;
        temp_file
            .flush()
            .map_err(|err| ConsoleError::io("Failed to flush temp store file", err))?;
        restrict_permissions(temp_file.path())?;
        temp_file
            .persist(&self.path)
            .map_err(|err| ConsoleError::io("Failed to commit store file", err.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_file().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.read_file();
        file.values.insert(key.to_string(), value.to_string());
        self.write_file(&file)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.read_file();
        if file.values.remove(key).is_none() {
            return Ok(());
        }
        self.write_file(&file)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs_err::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|err| ConsoleError::io("Failed to restrict store permissions", err))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn not_found() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotFound, "no parent directory")
}
