//! Outbound request descriptions.
//!
//! An `ApiRequest` is a plain value: it can be issued, held while a
//! refresh is in flight, and issued again. Nothing about retry state is
//! stored on it; the dispatcher tracks that in its own `Attempt`.

use reqwest::Method;
use serde::Serialize;

use super::paths::REFRESH_EXEMPT;
use super::ApiError;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    attach_auth: bool,
    allow_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            attach_auth: true,
            allow_refresh: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Send without the bearer credential (login, registration, public links).
    pub fn without_auth(mut self) -> Self {
        self.attach_auth = false;
        self
    }

    /// Surface a 401 directly instead of entering the refresh cycle.
    pub fn without_refresh(mut self) -> Self {
        self.allow_refresh = false;
        self
    }

    pub fn attaches_auth(&self) -> bool {
        self.attach_auth
    }

    /// Whether a 401 on this request may trigger a credential refresh.
    pub fn refresh_eligible(&self) -> bool {
        self.allow_refresh && !REFRESH_EXEMPT.contains(&self.path.as_str())
    }
}
