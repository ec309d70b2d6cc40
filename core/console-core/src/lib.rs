//! # console-core
//!
//! Core library for the blog admin console: session lifecycle, the typed REST
//! client, and client-side validation. The CLI is a thin shell around it.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Blocking HTTP, explicit `Instant`s.
//! - **One clearing contract**: token, identity, and attempt flag are dropped
//!   together, whoever notices the failure first.
//! - **Graceful degradation**: Missing or corrupt store files read as empty.
//! - **Seams as traits**: `Transport`, `Navigator`, `KeyValueStore`, and
//!   `SessionPort` are swappable; [`testing`] provides doubles.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use console_core::{Console, LoginForm, StorageConfig};
//!
//! let console = Console::open(&StorageConfig::new()?, "tab-1", navigator)?;
//! console.login(&LoginForm::new("admin", "secret"))?;
//! let page = console.blogs().list(None, None)?;
//! ```

pub mod auth;
pub mod blogs;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod patterns;
pub mod session;
pub mod storage;
pub mod testing;
pub mod transport;
pub mod users;
pub mod validation;

pub use blogs::{BlogService, ImageFile, StepOutcome};
pub use client::ApiClient;
pub use config::ConsoleConfig;
pub use engine::Console;
pub use error::{ConsoleError, Result};
pub use navigation::{guard, Navigator, Route, RouteDecision};
pub use notify::{Notice, NoticeLevel};
pub use session::{
    CoordinatorAction, Decision, JsonFileStore, KeyValueStore, MemoryStore, Session,
    SessionCoordinator, SessionPort, SessionSnapshot,
};
pub use storage::StorageConfig;
pub use transport::{HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport};
pub use users::{filter_users, UserService};
pub use validation::{BlogDraft, LoginForm, NewUserForm, ValidationError};
