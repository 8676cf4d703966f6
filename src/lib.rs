//! # Gatehouse
//!
//! `gatehouse` keeps the credentials an API client is handed by an authentication
//! service, refreshes them when the backend rejects an expired access token, and
//! decides which screens a visitor may reach based on that state.
//!
//! ## Flow Overview
//!
//! 1. **Login / registration:** [`AuthClient`] exchanges credentials for an access
//!    token, a refresh token and a user profile. [`SessionClient::login`] writes all
//!    three to the [`CredentialStore`] in one operation.
//! 2. **Protected calls:** every call goes through [`SessionClient::request`], which
//!    attaches the access token as a bearer credential. On a 401 it refreshes once
//!    over the bare [`AuthClient`] channel and replays the request exactly once.
//!    If the refresh cannot happen, the store is cleared and the [`Navigator`] is
//!    sent to the login screen.
//! 3. **Routing:** [`classify`] derives a [`Classification`] from the store;
//!    [`RouteGuard`] turns it into render / redirect / forbidden outcomes and
//!    [`RouteTable`] resolves a path through nested guards and the entry redirect.
//!
//! Tokens are held as `SecretString` and must never be logged.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod policy;
pub mod router;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use client::{ApiResponse, AuthClient, Navigator, PendingRequest, SessionClient};
pub use config::ClientConfig;
pub use error::{Error, FieldErrors, Result};
pub use guard::{GuardOutcome, RouteGuard};
pub use policy::{Classification, classify};
pub use router::{Resolution, Route, RouteTable, View, paths};
pub use session::{Session, SessionPatch, UserProfile};
pub use store::{CredentialStore, FileStorage, MemoryStorage, Storage};

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
