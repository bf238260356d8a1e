use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Admin gate configuration, the `[admin]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(flatten)]
    pub policy: AdminPolicyConfig,
    /// Idle time after which a session must log in again.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

/// Which admin policy to run, selected by `policy = "..."`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum AdminPolicyConfig {
    /// One shared secret.
    Secret {
        #[serde(default)]
        secret: String,
    },
    /// External identity service plus an optional allowed email.
    Identity {
        #[serde(default)]
        url: String,
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        allowed_email: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

fn default_session_ttl() -> u64 {
    8 * 60 * 60
}

fn default_timeout() -> u64 {
    15
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            policy: AdminPolicyConfig::Secret {
                secret: String::new(),
            },
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl AdminConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl std::fmt::Debug for AdminPolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret { secret } => f
                .debug_struct("Secret")
                .field("secret", &if secret.is_empty() { "<unset>" } else { "<redacted>" })
                .finish(),
            Self::Identity {
                url,
                allowed_email,
                timeout_secs,
                ..
            } => f
                .debug_struct("Identity")
                .field("url", url)
                .field("allowed_email", allowed_email)
                .field("timeout_secs", timeout_secs)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unset_secret() {
        let c = AdminConfig::default();
        assert_eq!(c.session_ttl(), Duration::from_secs(8 * 3600));
        assert_eq!(
            c.policy,
            AdminPolicyConfig::Secret {
                secret: String::new()
            }
        );
    }

    #[test]
    fn parses_identity_policy() {
        let c: AdminConfig = serde_json::from_str(
            r#"{"policy":"identity","url":"https://x.supabase.co","allowed_email":"a@b.c"}"#,
        )
        .unwrap();
        assert_eq!(c.session_ttl_secs, 8 * 3600);
        match c.policy {
            AdminPolicyConfig::Identity {
                url,
                allowed_email,
                timeout_secs,
                ..
            } => {
                assert_eq!(url, "https://x.supabase.co");
                assert_eq!(allowed_email.as_deref(), Some("a@b.c"));
                assert_eq!(timeout_secs, 15);
            }
            other => panic!("unexpected policy: {other:?}"),
        }
    }

    #[test]
    fn debug_hides_secret() {
        let policy = AdminPolicyConfig::Secret {
            secret: "hunter2".into(),
        };
        assert!(!format!("{policy:?}").contains("hunter2"));
    }
}
