use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GateError, GateResult};

/// An identity authenticated by an identity service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    /// Service session token, needed to sign the identity out again.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            access_token: None,
        }
    }
}

/// External email + password identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials. Rejections are [`GateError::AuthDenied`] with the
    /// service's own message.
    async fn sign_in(&self, email: &str, password: &str) -> GateResult<Identity>;

    /// End the identity's service session.
    async fn sign_out(&self, identity: &Identity) -> GateResult<()>;
}

/// Identity service speaking the GoTrue password-grant dialect.
#[derive(Clone, Debug)]
pub struct RemoteIdentityProvider {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl RemoteIdentityProvider {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> GateResult<Self> {
        if url.trim().is_empty() {
            return Err(GateError::Config("identity service needs a url".into()));
        }
        let mut headers = header::HeaderMap::new();
        if !api_key.is_empty() {
            let key = header::HeaderValue::from_str(api_key)
                .map_err(|e| GateError::Config(format!("invalid api key: {e}")))?;
            headers.insert("apikey", key);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/v1/token", self.base_url)
    }

    pub fn logout_url(&self) -> String {
        format!("{}/auth/v1/logout", self.base_url)
    }
}

/// The service's displayable message from an error body.
fn service_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| "Sign-in failed. Please try again.".to_string())
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> GateResult<Identity> {
        let response = self
            .client
            .post(self.token_url())
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GateError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GateError::Provider(e.to_string()))?;
        if !status.is_success() {
            debug!(%status, "identity service rejected sign-in");
            return Err(GateError::AuthDenied(service_message(&body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GateError::Provider(format!("unexpected sign-in response: {e}")))?;
        Ok(Identity {
            user_id: token.user.id,
            email: token.user.email,
            access_token: Some(token.access_token),
        })
    }

    async fn sign_out(&self, identity: &Identity) -> GateResult<()> {
        let Some(token) = &identity.access_token else {
            return Ok(());
        };
        let response = self
            .client
            .post(self.logout_url())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GateError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GateError::Provider(format!(
                "sign-out failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Fixed accounts held in memory, for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: HashMap<String, String>,
    sign_outs: AtomicUsize,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account. Emails match case-insensitively.
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        self.accounts
            .insert(email.to_ascii_lowercase(), password.to_string());
        self
    }

    /// How many times `sign_out` has been called.
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> GateResult<Identity> {
        let key = email.to_ascii_lowercase();
        match self.accounts.get(&key) {
            Some(expected) if expected == password => Ok(Identity {
                user_id: format!("user:{key}"),
                email: Some(email.to_string()),
                access_token: Some(format!("token:{key}")),
            }),
            _ => Err(GateError::denied("Invalid login credentials")),
        }
    }

    async fn sign_out(&self, _identity: &Identity) -> GateResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
