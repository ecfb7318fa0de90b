//! REST API client module for the LinkKeeper backend.
//!
//! This module provides the `SessionClient` for communicating with the
//! LinkKeeper API: account management, saved links, tags and sharing.
//!
//! Requests carry a bearer token issued at login. When the backend
//! rejects it with 401 the client rotates it through the refresh
//! endpoint, once, on behalf of every request that was affected.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod paths;
pub mod request;
pub mod transport;

pub use client::{RetryPolicy, SessionClient, SessionEvent};
pub use error::ApiError;
pub use request::ApiRequest;
pub use transport::{HttpTransport, RawResponse, Transport};
