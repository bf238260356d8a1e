use std::net::SocketAddr;
use std::path::Path;

use folio_gate::{AdminConfig, AdminPolicyConfig};
use folio_store::BackendConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Overrides the admin secret.
pub const ENV_ADMIN_SECRET: &str = "FOLIO_ADMIN_SECRET";
/// Overrides the remote backend key (and the identity service key when unset).
pub const ENV_BACKEND_API_KEY: &str = "FOLIO_BACKEND_API_KEY";
/// Overrides the allowed admin email.
pub const ENV_ADMIN_EMAIL: &str = "FOLIO_ADMIN_EMAIL";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub backend: BackendConfig,
    pub admin: AdminConfig,
    /// Contact relay; the contact route answers 503 without it.
    pub contact: Option<ContactConfig>,
    /// Request body cap. Inline images travel base64-encoded in JSON.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            backend: BackendConfig::default(),
            admin: AdminConfig::default(),
            contact: None,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConfig {
    #[serde(default = "default_contact_endpoint")]
    pub endpoint: String,
    pub recipient: String,
    #[serde(default = "default_contact_timeout")]
    pub timeout_secs: u64,
}

fn default_contact_endpoint() -> String {
    "https://formsubmit.co/ajax".into()
}

fn default_contact_timeout() -> u64 {
    15
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read a TOML file, or defaults when `path` is `None`, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply secret overrides from `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(api_key) = get(ENV_BACKEND_API_KEY) {
            if let BackendConfig::Remote(remote) = &mut self.backend {
                remote.api_key = api_key.clone();
            }
            if let AdminPolicyConfig::Identity { api_key: key, .. } = &mut self.admin.policy {
                if key.is_empty() {
                    *key = api_key;
                }
            }
        }

        match &mut self.admin.policy {
            AdminPolicyConfig::Secret { secret } => {
                if let Some(value) = get(ENV_ADMIN_SECRET) {
                    *secret = value;
                }
            }
            AdminPolicyConfig::Identity { allowed_email, .. } => {
                if let Some(value) = get(ENV_ADMIN_EMAIL) {
                    *allowed_email = Some(value);
                }
            }
        }
    }
}
