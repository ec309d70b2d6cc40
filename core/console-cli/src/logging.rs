//! File logging for the CLI.
//!
//! Stdout carries command output, so logs go to a daily-rolling file under
//! `~/.blog-console/logs/`. `BLOG_CONSOLE_DEBUG_LOG=1` forces debug level;
//! otherwise `RUST_LOG` applies, defaulting to `info`.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "BLOG_CONSOLE_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "blog-console.log";

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn build_filter() -> EnvFilter {
    if debug_forced(env::var(DEBUG_ENV).ok().as_deref()) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. The returned guard flushes on drop and
/// must live until the process exits. Returns `None` (no logging) when the
/// log directory cannot be created.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = fs_err::create_dir_all(logs_dir) {
        eprintln!("warning: logging disabled: {}", err);
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    if installed.is_err() {
        return None;
    }
    Some(guard)
}
