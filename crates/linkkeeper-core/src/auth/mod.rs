//! Authentication module for managing the session and its credential.
//!
//! This module provides:
//! - `Session`: identity state, bootstrap and login/logout flows
//! - `TokenStore`: persistence seam for the bearer credential, with
//!   file-backed (`FileTokenStore`), OS keychain (`KeyringTokenStore`)
//!   and in-memory (`MemoryTokenStore`) implementations
//!
//! The credential is opaque: it is never inspected or expired locally.
//! The server decides when it is stale and the session client refreshes it.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use session::{Session, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
