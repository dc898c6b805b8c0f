//! Request/response channel for "give me the current roles".
//!
//! The responder runs as its own task next to the store; requesters in
//! other contexts hold a cheap cloneable handle. Every failure on the
//! requesting side collapses to an empty role list.

use rolecast_core::error::MessagingError;
use rolecast_core::messaging::{ExtensionRequest, ExtensionResponse};
use rolecast_core::role::Role;
use rolecast_core::storage::RoleStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Envelope = (ExtensionRequest, oneshot::Sender<ExtensionResponse>);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for sending requests to a role responder.
#[derive(Clone)]
pub struct RoleRequester {
    sender: mpsc::Sender<Envelope>,
    timeout: Duration,
}

impl RoleRequester {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a request and wait for its response.
    pub async fn request(
        &self,
        request: ExtensionRequest,
    ) -> Result<ExtensionResponse, MessagingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send((request, reply_tx))
            .await
            .map_err(|_| MessagingError::Closed)?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(MessagingError::Closed),
            Err(_) => Err(MessagingError::Timeout {
                timeout_ms: millis(self.timeout),
            }),
        }
    }

    /// The current persisted roles, or an empty list on any failure.
    pub async fn get_roles(&self) -> Vec<Role> {
        match self.request(ExtensionRequest::GetRoles).await {
            Ok(response) => response.into_roles(),
            Err(e) => {
                warn!(error = %e, "Role request failed, using empty list");
                Vec::new()
            }
        }
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Start a responder task answering requests from `store`.
pub fn spawn_role_responder(
    store: Arc<dyn RoleStore>,
) -> (RoleRequester, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(32);

    let handle = tokio::spawn(async move {
        while let Some((request, reply)) = rx.recv().await {
            let response = match request {
                ExtensionRequest::GetRoles => match store.get_all().await {
                    Ok(roles) => ExtensionResponse::roles(roles),
                    Err(e) => {
                        warn!(error = %e, "Failed to read roles for request");
                        ExtensionResponse::roles(Vec::new())
                    }
                },
            };
            if reply.send(response).is_err() {
                debug!("Requester went away before the reply");
            }
        }
        debug!("Role responder stopped");
    });

    (
        RoleRequester {
            sender: tx,
            timeout: DEFAULT_TIMEOUT,
        },
        handle,
    )
}
