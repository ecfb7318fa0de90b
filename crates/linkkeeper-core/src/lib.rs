//! Core library for the LinkKeeper bookmarking client.
//!
//! - `api`: the `SessionClient` (credential attachment, token refresh,
//!   typed endpoints) and its transport seam
//! - `auth`: session state and credential stores
//! - `models`: users, saved links, tags and share links
//! - `config`: persisted settings and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, ApiRequest, SessionClient, SessionEvent};
pub use auth::{Session, SessionState, TokenStore};
pub use config::Config;
