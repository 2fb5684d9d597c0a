//! Recording fakes for the identity provider and the command layer.

use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::RemoteOperation;
use tokio::sync::{Mutex, Semaphore};

use crate::{
    executor::CommandExecutor,
    identity::{AuthenticatedIdentity, IdentityHandle, IdentityProvider, IdentityStatus},
};

#[derive(Default)]
pub(crate) struct FakeIdentity {
    pub verify_on_reload: Option<u32>,
    pub failing_reloads: Vec<u32>,
    pub login_error: Option<String>,
    pub login_verified: bool,
    pub end_session_error: Option<String>,
    pub reloads: Mutex<u32>,
    pub verification_messages: Mutex<u32>,
    pub end_session_calls: Mutex<u32>,
}

impl FakeIdentity {
    pub fn verified_on(reload: u32) -> Self {
        Self {
            verify_on_reload: Some(reload),
            login_verified: true,
            ..Self::default()
        }
    }

    pub fn rejecting_login(message: &str) -> Self {
        Self {
            login_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub async fn reload_count(&self) -> u32 {
        *self.reloads.lock().await
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn create_identity(&self, email: &str, _password: &str) -> Result<IdentityHandle> {
        if email.is_empty() {
            return Err(anyhow!("MISSING_EMAIL"));
        }
        Ok(IdentityHandle {
            identity_id: "uid-new".into(),
            email: email.to_string(),
            id_token: "signup-token".into(),
            refresh_token: None,
        })
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<AuthenticatedIdentity> {
        if let Some(err) = &self.login_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(AuthenticatedIdentity {
            identity_id: "uid-1".into(),
            token: "token-1".into(),
            email_verified: self.login_verified,
        })
    }

    async fn send_verification_message(&self, _identity: &IdentityHandle) -> Result<()> {
        *self.verification_messages.lock().await += 1;
        Ok(())
    }

    async fn reload_identity(&self, _identity: &IdentityHandle) -> Result<IdentityStatus> {
        let mut reloads = self.reloads.lock().await;
        *reloads += 1;
        if self.failing_reloads.contains(&*reloads) {
            return Err(anyhow!("network unreachable"));
        }
        Ok(IdentityStatus {
            verified: self.verify_on_reload.is_some_and(|n| *reloads >= n),
        })
    }

    async fn identity_token(&self, _identity: &IdentityHandle) -> Result<String> {
        Ok("verified-token".into())
    }

    async fn end_session(&self) -> Result<()> {
        *self.end_session_calls.lock().await += 1;
        match &self.end_session_error {
            Some(err) => Err(anyhow!(err.clone())),
            None => Ok(()),
        }
    }
}

/// Replies by operation name; unscripted operations succeed with an empty payload.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    replies: Mutex<HashMap<&'static str, Result<String, String>>>,
    calls: Mutex<Vec<RemoteOperation>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call blocks until the returned semaphore hands out a permit.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Some(Arc::clone(&gate)),
                ..Self::default()
            },
            gate,
        )
    }

    pub async fn reply(&self, operation: &'static str, payload: &str) {
        self.replies
            .lock()
            .await
            .insert(operation, Ok(payload.to_string()));
    }

    pub async fn fail(&self, operation: &'static str, message: &str) {
        self.replies
            .lock()
            .await
            .insert(operation, Err(message.to_string()));
    }

    pub async fn calls(&self) -> Vec<RemoteOperation> {
        self.calls.lock().await.clone()
    }

    pub async fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().await.iter().map(|op| op.name()).collect()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, operation: &RemoteOperation) -> Result<String> {
        self.calls.lock().await.push(operation.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        match self.replies.lock().await.get(operation.name()) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Ok(String::new()),
        }
    }
}

pub(crate) const SAMPLE_LISTING: &str = r#"[
    {"filename": "a.pdf", "category": "invoice"},
    {"filename": "b.pdf", "category": "invoice"},
    {"filename": "c.png"}
]"#;
