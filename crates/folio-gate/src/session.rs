use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::policy::AuthenticatedAdmin;

/// Opaque bearer token naming one admin session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// 32 random bytes, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "SessionToken({prefix}..)")
    }
}

/// A live admin session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    pub token: SessionToken,
    pub admin: AuthenticatedAdmin,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Where a token stands, as the admin page would render it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No usable session; `message` explains a forced logout.
    LoggedOut { message: Option<String> },
    LoggedIn(AdminSession),
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::LoggedOut { message } => message.as_deref(),
            Self::LoggedIn(_) => None,
        }
    }
}
