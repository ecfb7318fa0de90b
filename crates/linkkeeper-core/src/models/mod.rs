//! Data models for LinkKeeper entities.
//!
//! This module contains the data structures exchanged with the
//! LinkKeeper backend:
//!
//! - `User`: account identity returned by the auth endpoints
//! - `Content`, `NewContent`, `ContentKind`: saved links
//! - `Tag`: user-defined labels attached to content
//! - `ShareStatus`, `SharedCollection`: read-only share links
//! - Request payloads for registration, login and profile updates

pub mod content;
pub mod share;
pub mod user;

pub use content::{collect_tags, Content, ContentKind, ContentSearch, NewContent, Tag};
pub use share::{ShareStatus, SharedCollection};
pub use user::{AuthResponse, LoginRequest, MessageResponse, ProfileUpdate, RegisterRequest, User};
