//! Session lifecycle.
//!
//! Reconciles a persisted bearer token with server-verified identity.
//!
//! # Architecture
//!
//! ```text
//! credentials.json ─┐
//!   (durable token) │
//!                   ├─► Session ◄── SessionCoordinator (decides identity fetches)
//! tabs/<scope>.json ┘     ▲
//!   (attempt flag,        └──────── ApiClient (bearer header, 401 handling)
//!    redirect guard)
//! ```
//!
//! `Session` is the only writer of the auth-related keys in both stores. The
//! coordinator and the API client reach it through [`SessionPort`] (or the
//! concrete type for flag access) and agree on one clearing contract: token,
//! identity, and attempt flag are dropped together.
//!
//! # Module Structure
//!
//! - [`store`]: key/value stores (memory and JSON file)
//! - [`state`]: `Session`, `SessionPort`, snapshots
//! - [`coordinator`]: the identity-fetch decision policy and damped retry

pub mod coordinator;
pub mod state;
pub mod store;

pub use coordinator::{
    decide, CoordinatorAction, CoordinatorInputs, Decision, PendingRetry, SessionCoordinator,
};
pub use state::{AuthState, Session, SessionPort, SessionSnapshot};
pub use store::{
    JsonFileStore, KeyValueStore, MemoryStore, AUTH_INITIALIZED_KEY, IDENTITY_RETRIES_KEY,
    REDIRECTING_KEY, TOKEN_KEY,
};
