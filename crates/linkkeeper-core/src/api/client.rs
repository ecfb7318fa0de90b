//! Session client for the LinkKeeper REST API.
//!
//! `SessionClient` attaches the bearer credential to every request and
//! hides credential expiry from callers: the first request to see a 401
//! refreshes the credential, requests that hit a 401 while that refresh is
//! running wait for it, and every affected request is replayed once with
//! the new credential. If the refresh fails, every waiter fails with
//! `ApiError::RefreshFailed`, the credential is cleared and
//! `SessionEvent::Ended` is broadcast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use crate::auth::TokenStore;
use crate::config::Config;
use crate::models::AuthResponse;

use super::transport::{HttpTransport, Transport};
use super::{paths, ApiError, ApiRequest};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of times one request is replayed after a 401.
const MAX_AUTH_RETRIES: u32 = 1;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Buffer for session events; subscribers that lag only lose old events.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Backoff applied when the server answers 429.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RATE_LIMIT_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

/// Session lifecycle notifications broadcast by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential was rotated.
    Refreshed,
    /// The refresh failed and the credential was discarded. Consumers should
    /// treat this like a logout.
    Ended { reason: String },
}

/// What a queued request learns when the refresh it waited on settles.
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed,
    Failed(String),
    /// The task driving the refresh went away; a waiter must take over.
    Abandoned,
}

#[derive(Default)]
struct RefreshState {
    credential: Option<String>,
    refreshing: bool,
    /// Non-empty only while `refreshing` is set.
    pending: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl RefreshState {
    /// Resolve every queued waiter with `outcome` and return to idle.
    fn settle(&mut self, outcome: &RefreshOutcome) -> usize {
        let waiters = self.pending.len();
        for waiter in self.pending.drain(..) {
            // A dropped receiver means the caller went away.
            let _ = waiter.send(outcome.clone());
        }
        self.refreshing = false;
        waiters
    }
}

/// One request plus its retry bookkeeping.
struct Attempt<'a> {
    request: &'a ApiRequest,
    retries: u32,
}

impl<'a> Attempt<'a> {
    fn new(request: &'a ApiRequest) -> Self {
        Self { request, retries: 0 }
    }

    fn may_refresh(&self) -> bool {
        self.retries < MAX_AUTH_RETRIES
            && self.request.attaches_auth()
            && self.request.refresh_eligible()
    }
}

enum Recovery {
    Lead,
    Wait(oneshot::Receiver<RefreshOutcome>),
    Replay,
    SessionGone,
}

/// Resets the coordinator if the task driving a refresh is dropped mid-flight.
struct RefreshGuard<'a> {
    client: &'a SessionClient,
    armed: bool,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let waiters = self
                .client
                .state()
                .settle(&RefreshOutcome::Abandoned);
            warn!(waiters, "Credential refresh abandoned, handing over to a waiter");
        }
    }
}

/// Authenticated client for the LinkKeeper API.
///
/// Construct one per application and share it (`Arc<SessionClient>`);
/// the refresh coordination only holds within a single instance.
pub struct SessionClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    state: Mutex<RefreshState>,
    events: broadcast::Sender<SessionEvent>,
    retry_policy: RetryPolicy,
}

impl SessionClient {
    /// Create a client talking HTTP to the configured backend.
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::with_transport(Arc::new(transport), store))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        let credential = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to load stored credential");
                None
            }
        };
        debug!(has_credential = credential.is_some(), "Session client created");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            store,
            state: Mutex::new(RefreshState {
                credential,
                ..Default::default()
            }),
            events,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Credential =====

    /// The active credential, if any.
    pub fn credential(&self) -> Option<String> {
        self.state().credential.clone()
    }

    pub fn has_credential(&self) -> bool {
        self.state().credential.is_some()
    }

    /// Replace the active credential and persist it.
    pub fn set_credential(&self, token: String) {
        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "Failed to persist credential");
        }
        self.state().credential = Some(token);
    }

    /// Forget the active credential, in memory and in the store.
    pub fn clear_credential(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
        self.state().credential = None;
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().refreshing
    }

    /// Number of requests waiting on the in-flight refresh.
    pub fn pending_requests(&self) -> usize {
        self.state().pending.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ===== Dispatch =====

    /// Issue `request` and return the raw success body.
    pub async fn execute(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let mut attempt = Attempt::new(request);

        loop {
            let token = if request.attaches_auth() {
                self.credential()
            } else {
                None
            };

            match self.dispatch(request, token.as_deref()).await {
                Err(ApiError::Unauthorized) if attempt.may_refresh() => {
                    attempt.retries += 1;
                    debug!(method = %request.method, path = %request.path, "Unauthorized, recovering session");
                    self.recover(token.as_deref()).await?;
                }
                result => return result,
            }
        }
    }

    /// Issue `request` and decode the JSON success body.
    pub async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        parse_body(&request.path, &body)
    }

    /// One exchange with rate-limit retries; 401 is returned like any other
    /// classified error.
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<String, ApiError> {
        let mut retries = 0;
        let mut backoff = self.retry_policy.initial_backoff;

        loop {
            let response = self.transport.execute(request, token).await?;

            if response.status.is_success() {
                return Ok(response.body);
            }

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.retry_policy.max_retries {
                    return Err(ApiError::RateLimited);
                }
                warn!(
                    path = %request.path,
                    retry = retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                continue;
            }

            return Err(ApiError::from_status(response.status, &response.body));
        }
    }

    // ===== Refresh coordination =====

    /// Wait until a request that failed with `stale` may be replayed.
    async fn recover(&self, stale: Option<&str>) -> Result<(), ApiError> {
        loop {
            match self.begin_recovery(stale) {
                Recovery::Replay => {
                    debug!("Credential already rotated, replaying");
                    return Ok(());
                }
                Recovery::SessionGone => {
                    return Err(ApiError::RefreshFailed(
                        "session ended while the request was in flight".to_string(),
                    ));
                }
                Recovery::Wait(rx) => match rx.await {
                    Ok(RefreshOutcome::Refreshed) => return Ok(()),
                    Ok(RefreshOutcome::Failed(reason)) => return Err(ApiError::RefreshFailed(reason)),
                    // Leader dropped: compete to lead the next attempt
                    Ok(RefreshOutcome::Abandoned) | Err(_) => continue,
                },
                Recovery::Lead => return self.lead_refresh(stale).await,
            }
        }
    }

    fn begin_recovery(&self, stale: Option<&str>) -> Recovery {
        let mut state = self.state();
        if stale.is_some() && state.credential.is_none() {
            // Cleared by a failed refresh (or logout) after this request went out
            Recovery::SessionGone
        } else if state.credential.as_deref() != stale {
            Recovery::Replay
        } else if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.pending.push(tx);
            Recovery::Wait(rx)
        } else {
            state.refreshing = true;
            Recovery::Lead
        }
    }

    async fn lead_refresh(&self, stale: Option<&str>) -> Result<(), ApiError> {
        let mut guard = RefreshGuard {
            client: self,
            armed: true,
        };
        info!("Refreshing session credential");

        let outcome = self.request_new_credential(stale).await;
        guard.armed = false;

        match outcome {
            Ok(token) => {
                if let Err(e) = self.store.save(&token) {
                    warn!(error = %e, "Failed to persist refreshed credential");
                }
                let waiters = {
                    let mut state = self.state();
                    state.credential = Some(token);
                    state.settle(&RefreshOutcome::Refreshed)
                };
                info!(waiters, "Credential refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear stored credential");
                }
                let waiters = {
                    let mut state = self.state();
                    state.credential = None;
                    state.settle(&RefreshOutcome::Failed(reason.clone()))
                };
                warn!(waiters, reason = %reason, "Credential refresh failed, session ended");
                let _ = self.events.send(SessionEvent::Ended {
                    reason: reason.clone(),
                });
                Err(ApiError::RefreshFailed(reason))
            }
        }
    }

    /// Exchange the current credential for a new one. Sent with the stale
    /// credential as-is and never itself refreshed.
    async fn request_new_credential(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let request = ApiRequest::post(paths::REFRESH);
        let body = self.dispatch(&request, stale).await?;
        let auth: AuthResponse = parse_body(paths::REFRESH, &body)?;
        auth.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("refresh response carried no access token".to_string()))
    }
}

fn parse_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    // Some endpoints answer with an empty body
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;

    use super::*;
    use crate::api::transport::mock::{MockReply, MockTransport};
    use crate::auth::MemoryTokenStore;

    const ITEMS: &str = "/content/user-content";

    fn client_with(transport: Arc<MockTransport>, token: Option<&str>) -> (SessionClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let client = SessionClient::with_transport(transport, store.clone()).with_retry_policy(RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
        });
        (client, store)
    }

    /// Backend where `T1` is stale and the refresh endpoint issues `T2`.
    fn rotating_backend(refresh: MockReply) -> Arc<MockTransport> {
        MockTransport::new(move |req, token| {
            if req.path == paths::REFRESH {
                return refresh.clone();
            }
            match token {
                Some("T2") => MockReply::ok(&format!(r#"{{"path":"{}"}}"#, req.path)),
                _ => MockReply::unauthorized(),
            }
        })
    }

    #[tokio::test]
    async fn test_attaches_bearer_credential() {
        let transport = MockTransport::new(|_, _| MockReply::ok("{}"));
        let (client, _) = client_with(transport.clone(), Some("T1"));

        client.execute(&ApiRequest::get(ITEMS)).await.unwrap();
        client
            .execute(&ApiRequest::post(paths::LOGIN).without_auth())
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].token.as_deref(), Some("T1"));
        assert_eq!(calls[1].token, None);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_refresh() {
        let transport = rotating_backend(
            MockReply::ok(r#"{"accessToken":"T2"}"#).after(Duration::from_millis(20)),
        );
        let (client, store) = client_with(transport.clone(), Some("T1"));
        let mut events = client.subscribe();

        let requests: Vec<_> = ["/a", "/b", "/c"].iter().map(|p| ApiRequest::get(*p)).collect();
        let results = join_all(requests.iter().map(|r| client.execute(r))).await;

        for (result, path) in results.iter().zip(["/a", "/b", "/c"]) {
            let body = result.as_ref().expect("request should succeed after refresh");
            assert!(body.contains(path));
        }
        assert_eq!(transport.count(paths::REFRESH), 1);
        assert_eq!(transport.calls_to(paths::REFRESH)[0].token.as_deref(), Some("T1"));
        for path in ["/a", "/b", "/c"] {
            let tokens: Vec<_> = transport.calls_to(path).into_iter().map(|c| c.token).collect();
            assert_eq!(tokens, vec![Some("T1".to_string()), Some("T2".to_string())]);
        }

        assert!(!client.is_refreshing());
        assert_eq!(client.pending_requests(), 0);
        assert_eq!(client.credential().as_deref(), Some("T2"));
        assert_eq!(store.load().unwrap().as_deref(), Some("T2"));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_every_waiter() {
        let transport = rotating_backend(MockReply::unauthorized().after(Duration::from_millis(20)));
        let (client, store) = client_with(transport.clone(), Some("T1"));
        let mut events = client.subscribe();

        let requests: Vec<_> = ["/a", "/b", "/c"].iter().map(|p| ApiRequest::get(*p)).collect();
        let results = join_all(requests.iter().map(|r| client.execute(r))).await;

        for result in &results {
            assert!(matches!(result, Err(ApiError::RefreshFailed(_))), "got {:?}", result);
        }
        assert_eq!(transport.count(paths::REFRESH), 1);
        // No replay after a failed refresh
        assert_eq!(transport.calls().len(), 4);

        assert!(!client.is_refreshing());
        assert_eq!(client.pending_requests(), 0);
        assert!(!client.has_credential());
        assert_eq!(store.load().unwrap(), None);
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Ended { .. }));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_retried_twice() {
        let transport = MockTransport::new(|req, _| {
            if req.path == paths::REFRESH {
                MockReply::ok(r#"{"accessToken":"T2"}"#)
            } else {
                MockReply::unauthorized()
            }
        });
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let result = client.execute(&ApiRequest::get(ITEMS)).await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(transport.count(ITEMS), 2);
        assert_eq!(transport.count(paths::REFRESH), 1);
        assert_eq!(client.credential().as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_auth_endpoints_never_refresh() {
        let transport = MockTransport::new(|_, _| MockReply::unauthorized());
        let (client, _) = client_with(transport.clone(), Some("T1"));

        for path in [paths::LOGIN, paths::REGISTER, paths::AUTH_REGISTER, paths::REFRESH] {
            let result = client.execute(&ApiRequest::post(path)).await;
            assert_eq!(result, Err(ApiError::Unauthorized), "{}", path);
        }

        assert_eq!(transport.count(paths::REFRESH), 1); // only the direct call
        assert_eq!(transport.calls().len(), 4);
        assert!(!client.is_refreshing());
        assert_eq!(client.credential().as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn test_without_refresh_surfaces_unauthorized() {
        let transport = MockTransport::new(|_, _| MockReply::unauthorized());
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let result = client
            .execute(&ApiRequest::get(paths::ME).without_refresh())
            .await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(transport.count(paths::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_late_unauthorized_replays_with_rotated_credential() {
        let transport = MockTransport::new(|req, token| {
            match (req.path.as_str(), token) {
                (paths::REFRESH, _) => MockReply::ok(r#"{"accessToken":"T2"}"#),
                (_, Some("T2")) => MockReply::ok("{}"),
                ("/slow", _) => MockReply::unauthorized().after(Duration::from_millis(50)),
                _ => MockReply::unauthorized(),
            }
        });
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let slow = ApiRequest::get("/slow");
        let fast = ApiRequest::get("/fast");
        let (slow_result, fast_result) = tokio::join!(client.execute(&slow), client.execute(&fast));

        assert!(slow_result.is_ok());
        assert!(fast_result.is_ok());
        assert_eq!(transport.count(paths::REFRESH), 1);
        let slow_tokens: Vec<_> = transport.calls_to("/slow").into_iter().map(|c| c.token).collect();
        assert_eq!(slow_tokens, vec![Some("T1".to_string()), Some("T2".to_string())]);
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails_session() {
        let transport = rotating_backend(MockReply::ok(r#"{"message":"ok"}"#));
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let result = client.execute(&ApiRequest::get(ITEMS)).await;

        match result {
            Err(ApiError::RefreshFailed(reason)) => assert!(reason.contains("no access token")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!client.has_credential());
    }

    #[tokio::test]
    async fn test_cancelled_refresh_hands_over_to_waiter() {
        let refreshes = std::sync::atomic::AtomicUsize::new(0);
        let transport = MockTransport::new(move |req, token| match (req.path.as_str(), token) {
            (paths::REFRESH, _) => {
                let reply = MockReply::ok(r#"{"accessToken":"T2"}"#);
                if refreshes.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    reply.after(Duration::from_secs(5))
                } else {
                    reply
                }
            }
            (_, Some("T2")) => MockReply::ok("{}"),
            // The follower's 401 lands after the leader has started refreshing
            ("/b", _) => MockReply::unauthorized().after(Duration::from_millis(10)),
            _ => MockReply::unauthorized(),
        });
        let (client, store) = client_with(transport.clone(), Some("T1"));
        let mut events = client.subscribe();

        let leader = ApiRequest::get("/a");
        let follower = ApiRequest::get("/b");
        let (leader_result, follower_result) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(30), client.execute(&leader)),
            client.execute(&follower),
        );

        assert!(leader_result.is_err(), "leader should time out");
        assert_eq!(follower_result, Ok("{}".to_string()));
        assert_eq!(transport.count(paths::REFRESH), 2);
        let follower_tokens: Vec<_> = transport.calls_to("/b").into_iter().map(|c| c.token).collect();
        assert_eq!(follower_tokens, vec![Some("T1".to_string()), Some("T2".to_string())]);

        assert!(!client.is_refreshing());
        assert_eq!(client.pending_requests(), 0);
        assert_eq!(client.credential().as_deref(), Some("T2"));
        assert_eq!(store.load().unwrap().as_deref(), Some("T2"));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_late_unauthorized_after_failed_refresh_is_not_replayed() {
        let transport = MockTransport::new(|req, _| match req.path.as_str() {
            "/slow" => MockReply::unauthorized().after(Duration::from_millis(50)),
            _ => MockReply::unauthorized(),
        });
        let (client, _) = client_with(transport.clone(), Some("T1"));
        let mut events = client.subscribe();

        let slow = ApiRequest::get("/slow");
        let fast = ApiRequest::get("/fast");
        let (slow_result, fast_result) = tokio::join!(client.execute(&slow), client.execute(&fast));

        assert!(matches!(fast_result, Err(ApiError::RefreshFailed(_))), "got {:?}", fast_result);
        assert!(matches!(slow_result, Err(ApiError::RefreshFailed(_))), "got {:?}", slow_result);
        // No unauthenticated resend of the slow request
        let slow_tokens: Vec<_> = transport.calls_to("/slow").into_iter().map(|c| c.token).collect();
        assert_eq!(slow_tokens, vec![Some("T1".to_string())]);
        assert_eq!(transport.count(paths::REFRESH), 1);
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Ended { .. }));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rate_limit_backoff_then_success() {
        let attempts = std::sync::atomic::AtomicUsize::new(0);
        let transport = MockTransport::new(move |_, _| {
            if attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
                MockReply::status(429, "")
            } else {
                MockReply::ok(r#"{"content":[]}"#)
            }
        });
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let body = client.execute(&ApiRequest::get(ITEMS)).await.unwrap();
        assert_eq!(body, r#"{"content":[]}"#);
        assert_eq!(transport.count(ITEMS), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let transport = MockTransport::new(|_, _| MockReply::status(429, ""));
        let (client, _) = client_with(transport.clone(), Some("T1"));

        let result = client.execute(&ApiRequest::get(ITEMS)).await;
        assert_eq!(result, Err(ApiError::RateLimited));
        assert_eq!(transport.count(ITEMS), 3);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_unchanged() {
        let transport = MockTransport::new(|req, _| match req.path.as_str() {
            "/forbidden" => MockReply::status(403, r#"{"message":"not yours"}"#),
            "/invalid" => MockReply::status(422, r#"{"message":"Invalid URL"}"#),
            "/broken" => MockReply::status(500, r#"{"message":"boom"}"#),
            _ => MockReply::network_error(),
        });
        let (client, _) = client_with(transport.clone(), Some("T1"));

        assert_eq!(
            client.execute(&ApiRequest::get("/forbidden")).await,
            Err(ApiError::Forbidden("not yours".to_string()))
        );
        assert_eq!(
            client.execute(&ApiRequest::post("/invalid")).await,
            Err(ApiError::ValidationFailed("Invalid URL".to_string()))
        );
        assert_eq!(
            client.execute(&ApiRequest::get("/broken")).await,
            Err(ApiError::ServerError("boom".to_string()))
        );
        assert!(matches!(
            client.execute(&ApiRequest::get("/offline")).await,
            Err(ApiError::NetworkError(_))
        ));
        assert_eq!(transport.count(paths::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_send_decodes_json_and_empty_bodies() {
        let transport = MockTransport::new(|req, _| match req.path.as_str() {
            "/empty" => MockReply::ok(""),
            "/garbage" => MockReply::ok("<html>"),
            _ => MockReply::ok(r#"{"message":"done"}"#),
        });
        let (client, _) = client_with(transport, Some("T1"));

        let msg: crate::models::MessageResponse = client.send(&ApiRequest::get("/msg")).await.unwrap();
        assert_eq!(msg.message.as_deref(), Some("done"));

        let empty: crate::models::MessageResponse = client.send(&ApiRequest::delete("/empty")).await.unwrap();
        assert_eq!(empty.message, None);

        let garbage: Result<crate::models::MessageResponse, _> = client.send(&ApiRequest::get("/garbage")).await;
        assert!(matches!(garbage, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_set_and_clear_credential_persist() {
        let transport = MockTransport::new(|_, _| MockReply::ok("{}"));
        let (client, store) = client_with(transport, None);

        assert!(!client.has_credential());
        client.set_credential("fresh".to_string());
        assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));

        client.clear_credential();
        assert!(!client.has_credential());
        assert_eq!(store.load().unwrap(), None);
    }
}
