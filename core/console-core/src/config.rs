//! Console configuration.
//!
//! Loaded from `~/.blog-console/config.toml` (a missing file means defaults),
//! then overridden by `BLOG_CONSOLE_API_BASE_URL`. The backend base URL is the
//! only environment-driven input.

use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConsoleError, Result};

pub const BASE_URL_ENV: &str = "BLOG_CONSOLE_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_IDENTITY_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed delay before the single damped identity retry.
    #[serde(default = "default_identity_retry_delay_ms")]
    pub identity_retry_delay_ms: u64,
    /// Upper bound on damped identity retries before the session is dropped.
    /// Unset keeps retrying.
    #[serde(default)]
    pub max_identity_retries: Option<u32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            identity_retry_delay_ms: default_identity_retry_delay_ms(),
            max_identity_retries: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ConsoleConfig {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs_err::read_to_string(path)
            .map_err(|err| ConsoleError::io("Failed to read console config", err))?;
        let mut config =
            toml::from_str::<ConsoleConfig>(&content).map_err(|err| ConsoleError::ConfigMalformed {
                path: path.to_path_buf(),
                details: err.to_string(),
            })?;
        config.base_url = normalize_base_url(&config.base_url);
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        let normalized = normalize_base_url(base_url.as_ref());
        if !normalized.is_empty() {
            self.base_url = normalized;
        }
        self
    }

    pub fn identity_retry_delay(&self) -> Duration {
        Duration::from_millis(self.identity_retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_identity_retry_delay_ms() -> u64 {
    DEFAULT_IDENTITY_RETRY_DELAY_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
