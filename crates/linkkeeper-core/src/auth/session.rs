//! Identity state shared with front ends.
//!
//! `Session` wraps a `SessionClient` and publishes who is logged in. It
//! starts in `SessionState::Loading` so front ends can hold off on
//! rendering a logged-out view until `bootstrap` has decided.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{paths, ApiError, ApiRequest, SessionClient, SessionEvent};
use crate::models::{LoginRequest, RegisterRequest, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Bootstrap has not finished yet.
    Loading,
    Anonymous,
    Active(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Active(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

pub struct Session {
    client: Arc<SessionClient>,
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    pub fn new(client: Arc<SessionClient>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            client,
            state: Arc::new(state),
        }
    }

    pub fn client(&self) -> &Arc<SessionClient> {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn publish(&self, next: SessionState) {
        self.state.send_replace(next);
    }

    /// Restore the session from the stored credential.
    ///
    /// Without a credential this settles on `Anonymous` without touching
    /// the network. Otherwise the credential is checked against the
    /// identity endpoint; a 401 there is final and is not refreshed.
    pub async fn bootstrap(&self) -> SessionState {
        self.publish(SessionState::Loading);

        if !self.client.has_credential() {
            debug!("No stored credential");
            self.publish(SessionState::Anonymous);
            return SessionState::Anonymous;
        }

        let next = match self
            .client
            .fetch_me(ApiRequest::get(paths::ME).without_refresh())
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                SessionState::Active(user)
            }
            Err(e) => {
                debug!(error = %e, "Stored credential rejected");
                self.client.clear_credential();
                SessionState::Anonymous
            }
        };
        self.publish(next.clone());
        next
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<User, ApiError> {
        let user = self.client.login(payload).await?;
        self.publish(SessionState::Active(user.clone()));
        Ok(user)
    }

    /// Create an account. The session stays as it was; log in afterwards.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<Option<String>, ApiError> {
        self.client.register(payload).await
    }

    /// End the session. The local credential is dropped even if the server
    /// call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "Logout request failed");
        }
        self.client.clear_credential();
        self.publish(SessionState::Anonymous);
    }

    pub async fn delete_account(&self) -> Result<Option<String>, ApiError> {
        let message = self.client.delete_account().await?;
        self.publish(SessionState::Anonymous);
        Ok(message)
    }

    /// Move to `Anonymous` whenever the client reports a failed refresh.
    pub fn monitor(&self) -> JoinHandle<()> {
        let mut events = self.client.subscribe();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Ended { reason }) => {
                        info!(reason = %reason, "Session ended");
                        state.send_replace(SessionState::Anonymous);
                    }
                    Ok(SessionEvent::Refreshed) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session monitor lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
