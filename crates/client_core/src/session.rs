//! Credential exchange, session persistence and the email-verification poller.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Session, SessionToken, UserId},
    error::WorkspaceError,
};
use storage::SessionStore;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::identity::{IdentityHandle, IdentityProvider};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPending {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    Pending { attempts: u32 },
    Verified(Session),
    Expired { attempts: u32 },
}

/// Handle to the background verification loop. Dropping it stops the loop.
pub struct VerificationPoller {
    task: JoinHandle<()>,
    state: watch::Receiver<VerificationState>,
}

impl VerificationPoller {
    pub fn state(&self) -> VerificationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VerificationState> {
        self.state.clone()
    }

    pub async fn wait(&self) -> Result<Session, WorkspaceError> {
        wait_for_verification(self.subscribe()).await
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for VerificationPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Resolves once the poller reports a terminal state, or errors if it was torn down first.
pub async fn wait_for_verification(
    mut state: watch::Receiver<VerificationState>,
) -> Result<Session, WorkspaceError> {
    loop {
        let current = state.borrow_and_update().clone();
        match current {
            VerificationState::Verified(session) => return Ok(session),
            VerificationState::Expired { attempts } => {
                return Err(WorkspaceError::VerificationExpired { attempts })
            }
            VerificationState::Pending { .. } => {}
        }
        if state.changed().await.is_err() {
            return Err(WorkspaceError::Auth("email verification was cancelled".into()));
        }
    }
}

pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    policy: VerificationPolicy,
    pending: Arc<Mutex<Option<IdentityHandle>>>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_policy(identity, store, VerificationPolicy::default())
    }

    pub fn with_policy(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn SessionStore>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            identity,
            store,
            policy,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Session persisted by an earlier run, if any.
    pub async fn restore(&self) -> Option<Session> {
        match self.store.load().await {
            Ok(Some(stored)) => {
                debug!(
                    user_id = %stored.session.user_id,
                    persisted_at = %stored.persisted_at,
                    "found persisted session"
                );
                Some(stored.session)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read persisted session");
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, WorkspaceError> {
        let identity = self
            .identity
            .authenticate(email, password)
            .await
            .map_err(|err| {
                warn!(error = %err, "login rejected");
                WorkspaceError::Auth(err.to_string())
            })?;

        let session = Session::new(
            UserId(identity.identity_id),
            SessionToken(identity.token),
            identity.email_verified,
        );
        self.store
            .save(&session)
            .await
            .map_err(|err| WorkspaceError::Auth(format!("failed to save session: {err}")))?;
        info!(user_id = %session.user_id, email_verified = session.email_verified, "login succeeded");
        Ok(session)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerificationPending, WorkspaceError> {
        let handle = self
            .identity
            .create_identity(email, password)
            .await
            .map_err(|err| WorkspaceError::Auth(err.to_string()))?;
        self.identity
            .send_verification_message(&handle)
            .await
            .map_err(|err| WorkspaceError::Auth(err.to_string()))?;

        info!(identity_id = %handle.identity_id, "signup succeeded; verification message sent");
        let pending = VerificationPending {
            email: handle.email.clone(),
        };
        *self.pending.lock().await = Some(handle);
        Ok(pending)
    }

    pub async fn pending_email(&self) -> Option<String> {
        self.pending.lock().await.as_ref().map(|h| h.email.clone())
    }

    /// Re-sends the verification message; a no-op when no identity is pending.
    pub async fn resend_verification(&self) -> Result<(), WorkspaceError> {
        let Some(handle) = self.pending.lock().await.clone() else {
            debug!("resend requested without a pending identity");
            return Ok(());
        };
        self.identity
            .send_verification_message(&handle)
            .await
            .map_err(|err| WorkspaceError::Auth(err.to_string()))?;
        info!(email = %handle.email, "verification message re-sent");
        Ok(())
    }

    /// Starts polling the pending identity; `None` when nothing is pending.
    pub async fn start_verification(&self) -> Option<VerificationPoller> {
        let handle = self.pending.lock().await.clone()?;
        let (tx, rx) = watch::channel(VerificationState::Pending { attempts: 0 });
        let identity = Arc::clone(&self.identity);
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let policy = self.policy;

        let task = tokio::spawn(async move {
            let mut attempts = 0;
            while attempts < policy.max_attempts {
                tokio::time::sleep(policy.interval).await;
                attempts += 1;

                let verified = match identity.reload_identity(&handle).await {
                    Ok(status) => status.verified,
                    Err(err) => {
                        warn!(attempt = attempts, error = %err, "verification reload failed");
                        false
                    }
                };
                debug!(attempt = attempts, verified, "verification poll");

                if verified {
                    match acquire_verified_session(identity.as_ref(), store.as_ref(), &handle).await
                    {
                        Ok(session) => {
                            info!(user_id = %session.user_id, attempts, "email verified");
                            pending.lock().await.take();
                            let _ = tx.send(VerificationState::Verified(session));
                            return;
                        }
                        Err(err) => {
                            warn!(attempt = attempts, error = %err, "verified but session acquisition failed");
                        }
                    }
                }
                let _ = tx.send(VerificationState::Pending { attempts });
            }

            warn!(attempts, "email verification polling gave up");
            let _ = tx.send(VerificationState::Expired { attempts });
        });

        Some(VerificationPoller { task, state: rx })
    }

    /// Forgets the pending identity ("back to login").
    pub async fn cancel_verification(&self) {
        if self.pending.lock().await.take().is_some() {
            debug!("pending verification abandoned");
        }
    }

    /// Always clears local state, whatever the provider says.
    pub async fn logout(&self) {
        if let Err(err) = self.identity.end_session().await {
            warn!(error = %err, "remote sign-out failed; clearing local session anyway");
        }
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear persisted session");
        }
        self.pending.lock().await.take();
        info!("logged out");
    }
}

async fn acquire_verified_session(
    identity: &dyn IdentityProvider,
    store: &dyn SessionStore,
    handle: &IdentityHandle,
) -> anyhow::Result<Session> {
    let token = identity.identity_token(handle).await?;
    let session = Session::new(
        UserId(handle.identity_id.clone()),
        SessionToken(token),
        true,
    );
    store.save(&session).await?;
    Ok(session)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
