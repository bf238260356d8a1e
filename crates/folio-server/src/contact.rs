use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ContactConfig;
use crate::error::{ServerError, ServerResult};

/// A visitor's message from the contact page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// All four fields are required.
    pub fn validate(&self) -> ServerResult<()> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServerError::Validation(format!(
                "Please fill in: {}.",
                missing.join(", ")
            )))
        }
    }
}

/// Delivers contact messages somewhere a human will read them.
#[async_trait]
pub trait ContactRelay: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> ServerResult<()>;
}

/// Posts messages to a form-relay service's AJAX endpoint.
pub struct FormRelay {
    client: Client,
    url: String,
}

impl FormRelay {
    pub fn new(config: &ContactConfig) -> ServerResult<Self> {
        if config.recipient.trim().is_empty() {
            return Err(ServerError::Config("contact recipient is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServerError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.recipient.trim()
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContactRelay for FormRelay {
    async fn send(&self, message: &ContactMessage) -> ServerResult<()> {
        message.validate()?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(message)
            .send()
            .await
            .map_err(|e| ServerError::ContactFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "form relay rejected message");
            return Err(ServerError::ContactFailed(format!("relay answered {status}")));
        }
        info!(subject = %message.subject, "contact message relayed");
        Ok(())
    }
}

/// Keeps messages in memory instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryRelay {
    sent: RwLock<Vec<ContactMessage>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ContactMessage> {
        self.sent.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ContactRelay for MemoryRelay {
    async fn send(&self, message: &ContactMessage) -> ServerResult<()> {
        message.validate()?;
        self.sent
            .write()
            .expect("lock poisoned")
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Commission".into(),
            message: "Do you take commissions?".into(),
        }
    }

    fn config(endpoint: &str) -> ContactConfig {
        ContactConfig {
            endpoint: endpoint.into(),
            recipient: "studio@example.com".into(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn complete_message_is_valid() {
        assert!(message().validate().is_ok());
    }

    #[test]
    fn missing_fields_are_named() {
        let msg = ContactMessage {
            subject: "  ".into(),
            message: String::new(),
            ..message()
        };
        let err = msg.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: subject, message.");
    }

    #[test]
    fn relay_url_joins_endpoint_and_recipient() {
        let relay = FormRelay::new(&config("https://formsubmit.co/ajax/")).unwrap();
        assert_eq!(relay.url(), "https://formsubmit.co/ajax/studio@example.com");
    }

    #[test]
    fn relay_requires_recipient() {
        let mut cfg = config("https://formsubmit.co/ajax");
        cfg.recipient = " ".into();
        assert!(matches!(FormRelay::new(&cfg), Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn invalid_message_never_reaches_network() {
        let relay = FormRelay::new(&config("http://127.0.0.1:9")).unwrap();
        let err = relay.send(&ContactMessage::default()).await.unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_relay_fails() {
        let relay = FormRelay::new(&config("http://127.0.0.1:9")).unwrap();
        let err = relay.send(&message()).await.unwrap_err();
        assert!(matches!(err, ServerError::ContactFailed(_)));
    }

    #[tokio::test]
    async fn memory_relay_records() {
        let relay = MemoryRelay::new();
        relay.send(&message()).await.unwrap();
        assert_eq!(relay.sent(), vec![message()]);
    }
}
