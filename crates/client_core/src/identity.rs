//! Identity provider boundary and its REST adapter.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Identity created by signup that has not produced a usable session yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHandle {
    pub identity_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub identity_id: String,
    pub token: String,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityStatus {
    pub verified: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_identity(&self, email: &str, password: &str) -> Result<IdentityHandle>;
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedIdentity>;
    async fn send_verification_message(&self, identity: &IdentityHandle) -> Result<()>;
    async fn reload_identity(&self, identity: &IdentityHandle) -> Result<IdentityStatus>;
    /// Fresh session token for an identity, used once verification is observed.
    async fn identity_token(&self, identity: &IdentityHandle) -> Result<String>;
    async fn end_session(&self) -> Result<()>;
}

pub struct MissingIdentityProvider;

#[async_trait]
impl IdentityProvider for MissingIdentityProvider {
    async fn create_identity(&self, _email: &str, _password: &str) -> Result<IdentityHandle> {
        Err(anyhow!("identity provider is unavailable"))
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<AuthenticatedIdentity> {
        Err(anyhow!("identity provider is unavailable"))
    }

    async fn send_verification_message(&self, _identity: &IdentityHandle) -> Result<()> {
        Err(anyhow!("identity provider is unavailable"))
    }

    async fn reload_identity(&self, _identity: &IdentityHandle) -> Result<IdentityStatus> {
        Err(anyhow!("identity provider is unavailable"))
    }

    async fn identity_token(&self, _identity: &IdentityHandle) -> Result<String> {
        Err(anyhow!("identity provider is unavailable"))
    }

    async fn end_session(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Email/password identity over an Identity-Toolkit-style REST API.
pub struct RestIdentityProvider {
    http: Client,
    base_url: String,
    token_url: String,
    api_key: String,
}

impl RestIdentityProvider {
    pub fn new(base_url: &str, token_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid identity url: {base_url}"))?;
        let token =
            Url::parse(token_url).with_context(|| format!("invalid token url: {token_url}"))?;
        Ok(Self {
            http: Client::new(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            token_url: token.to_string(),
            api_key: api_key.into(),
        })
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let res = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach identity provider at {url}"))?;
        decode(res).await
    }

    async fn account_call<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{method}", self.base_url);
        debug!(method, "identity request");
        self.post(&url, body).await
    }

    async fn lookup(&self, id_token: &str) -> Result<IdentityStatus> {
        let body: LookupResponse = self
            .account_call("lookup", &LookupRequest { id_token })
            .await?;
        let user = body
            .users
            .first()
            .ok_or_else(|| anyhow!("identity no longer exists"))?;
        Ok(IdentityStatus {
            verified: user.email_verified,
        })
    }
}

async fn decode<R: DeserializeOwned>(res: Response) -> Result<R> {
    let status = res.status();
    if status.is_success() {
        return res
            .json::<R>()
            .await
            .context("unexpected identity provider response");
    }

    let text = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ProviderErrorBody>(&text) {
        Ok(body) => Err(anyhow!(body.error.message)),
        Err(_) => Err(anyhow!("identity provider returned {status}")),
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<IdentityHandle> {
        let body: PasswordResponse = self
            .account_call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(IdentityHandle {
            identity_id: body.local_id,
            email: body.email.unwrap_or_else(|| email.to_string()),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedIdentity> {
        let body: PasswordResponse = self
            .account_call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let status = self.lookup(&body.id_token).await?;
        Ok(AuthenticatedIdentity {
            identity_id: body.local_id,
            token: body.id_token,
            email_verified: status.verified,
        })
    }

    async fn send_verification_message(&self, identity: &IdentityHandle) -> Result<()> {
        let _: serde_json::Value = self
            .account_call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token: &identity.id_token,
                },
            )
            .await?;
        Ok(())
    }

    async fn reload_identity(&self, identity: &IdentityHandle) -> Result<IdentityStatus> {
        self.lookup(&identity.id_token).await
    }

    async fn identity_token(&self, identity: &IdentityHandle) -> Result<String> {
        let Some(refresh_token) = identity.refresh_token.as_deref() else {
            return Ok(identity.id_token.clone());
        };
        let body: RefreshResponse = self
            .post(
                &self.token_url,
                &RefreshRequest {
                    grant_type: "refresh_token",
                    refresh_token,
                },
            )
            .await?;
        Ok(body.id_token)
    }

    async fn end_session(&self) -> Result<()> {
        // Tokens are bearer-only; nothing to revoke server side.
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
