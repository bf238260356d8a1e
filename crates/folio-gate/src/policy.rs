use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GateError, GateResult};
use crate::identity::{Identity, IdentityProvider};

/// Shown when an authenticated identity is not the configured admin.
pub const NOT_ALLOWED_MESSAGE: &str = "This user is not allowed to access admin.";

/// What the login form submits.
#[derive(Clone, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    EmailPassword { email: String, password: String },
    Secret { secret: String },
}

impl Credentials {
    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::EmailPassword {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn secret(secret: impl Into<String>) -> Self {
        Self::Secret {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Secret { .. } => f.write_str("Secret(..)"),
        }
    }
}

/// Who a successful login belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthenticatedAdmin {
    /// Display name: the identity's email, or `"admin"` for secret logins.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

/// Decides who may act as admin.
#[async_trait]
pub trait AdminPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check credentials. Every rejection is [`GateError::AuthDenied`] with a
    /// displayable message, except an unreachable identity service.
    async fn verify(&self, credentials: &Credentials) -> GateResult<AuthenticatedAdmin>;

    /// Whether an identity reported by the identity service may stay admin.
    fn permits(&self, _identity: &Identity) -> bool {
        true
    }

    /// Undo any external session held by `admin`.
    async fn release(&self, _admin: &AuthenticatedAdmin) -> GateResult<()> {
        Ok(())
    }
}

/// Sign in through an identity service, then require the configured email.
pub struct AllowListPolicy {
    provider: Arc<dyn IdentityProvider>,
    allowed_email: Option<String>,
}

impl AllowListPolicy {
    /// `allowed_email` of `None` (or blank) accepts any authenticated identity.
    pub fn new(provider: Arc<dyn IdentityProvider>, allowed_email: Option<String>) -> Self {
        let allowed_email = allowed_email
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty());
        if allowed_email.is_none() {
            warn!("no admin email configured; any authenticated identity is admin");
        }
        Self {
            provider,
            allowed_email,
        }
    }
}

#[async_trait]
impl AdminPolicy for AllowListPolicy {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn verify(&self, credentials: &Credentials) -> GateResult<AuthenticatedAdmin> {
        let Credentials::EmailPassword { email, password } = credentials else {
            return Err(GateError::denied("Email and password are required."));
        };
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(GateError::denied("Email and password are required."));
        }

        let identity = self.provider.sign_in(email, password).await?;
        if !self.permits(&identity) {
            warn!(user = %identity.user_id, "identity is not the configured admin");
            if let Err(e) = self.provider.sign_out(&identity).await {
                warn!(error = %e, "failed to sign out rejected identity");
            }
            return Err(GateError::denied(NOT_ALLOWED_MESSAGE));
        }

        Ok(AuthenticatedAdmin {
            name: identity.email.clone().unwrap_or_else(|| identity.user_id.clone()),
            identity: Some(identity),
        })
    }

    fn permits(&self, identity: &Identity) -> bool {
        match &self.allowed_email {
            None => true,
            Some(allowed) => identity
                .email
                .as_deref()
                .is_some_and(|e| e.trim().eq_ignore_ascii_case(allowed)),
        }
    }

    async fn release(&self, admin: &AuthenticatedAdmin) -> GateResult<()> {
        match &admin.identity {
            Some(identity) => self.provider.sign_out(identity).await,
            None => Ok(()),
        }
    }
}

/// Compare a submitted secret with one configured value.
///
/// Both sides are hashed before comparison so the check does not leak the
/// matching prefix length.
pub struct SharedSecretPolicy {
    digest: blake3::Hash,
}

impl SharedSecretPolicy {
    pub fn new(secret: &str) -> GateResult<Self> {
        if secret.is_empty() {
            return Err(GateError::Config("admin secret is empty".into()));
        }
        Ok(Self {
            digest: blake3::hash(secret.as_bytes()),
        })
    }
}

#[async_trait]
impl AdminPolicy for SharedSecretPolicy {
    fn name(&self) -> &'static str {
        "secret"
    }

    async fn verify(&self, credentials: &Credentials) -> GateResult<AuthenticatedAdmin> {
        // The password field doubles as the secret for single-field forms.
        let submitted = match credentials {
            Credentials::Secret { secret } => secret,
            Credentials::EmailPassword { password, .. } => password,
        };
        if submitted.is_empty() {
            return Err(GateError::denied("Password is required."));
        }
        if blake3::hash(submitted.as_bytes()) != self.digest {
            debug!("admin secret mismatch");
            return Err(GateError::denied("Incorrect password."));
        }
        Ok(AuthenticatedAdmin {
            name: "admin".into(),
            identity: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityProvider;

    fn provider() -> Arc<InMemoryIdentityProvider> {
        Arc::new(
            InMemoryIdentityProvider::new()
                .with_account("artist@studio.com", "pw")
                .with_account("visitor@example.com", "pw"),
        )
    }

    // ----- Shared secret -----

    #[tokio::test]
    async fn secret_accepts_exact_match() {
        let policy = SharedSecretPolicy::new("s3cret").unwrap();
        let admin = policy.verify(&Credentials::secret("s3cret")).await.unwrap();
        assert_eq!(admin.name, "admin");
        assert!(admin.identity.is_none());
    }

    #[tokio::test]
    async fn secret_accepts_password_field() {
        let policy = SharedSecretPolicy::new("s3cret").unwrap();
        let creds = Credentials::email_password("", "s3cret");
        assert!(policy.verify(&creds).await.is_ok());
    }

    #[tokio::test]
    async fn secret_rejects_mismatch() {
        let policy = SharedSecretPolicy::new("s3cret").unwrap();
        let err = policy.verify(&Credentials::secret("S3cret")).await.unwrap_err();
        assert_eq!(err, GateError::denied("Incorrect password."));
        let err = policy.verify(&Credentials::secret("")).await.unwrap_err();
        assert!(matches!(err, GateError::AuthDenied(_)));
    }

    #[test]
    fn empty_secret_is_config_error() {
        assert!(matches!(
            SharedSecretPolicy::new(""),
            Err(GateError::Config(_))
        ));
    }

    // ----- Allow list -----

    #[tokio::test]
    async fn allow_list_accepts_configured_email_case_insensitively() {
        let policy = AllowListPolicy::new(provider(), Some("Artist@Studio.com".into()));
        let admin = policy
            .verify(&Credentials::email_password("artist@studio.com", "pw"))
            .await
            .unwrap();
        assert_eq!(admin.name, "artist@studio.com");
        assert!(admin.identity.is_some());
    }

    #[tokio::test]
    async fn allow_list_rejects_and_signs_out_other_identity() {
        let provider = provider();
        let policy = AllowListPolicy::new(provider.clone(), Some("artist@studio.com".into()));
        let err = policy
            .verify(&Credentials::email_password("visitor@example.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::denied(NOT_ALLOWED_MESSAGE));
        assert_eq!(provider.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn allow_list_passes_through_provider_rejection() {
        let policy = AllowListPolicy::new(provider(), Some("artist@studio.com".into()));
        let err = policy
            .verify(&Credentials::email_password("artist@studio.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::denied("Invalid login credentials"));
    }

    #[tokio::test]
    async fn allow_list_without_email_accepts_anyone_authenticated() {
        let policy = AllowListPolicy::new(provider(), None);
        assert!(policy
            .verify(&Credentials::email_password("visitor@example.com", "pw"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn allow_list_requires_email_and_password() {
        let policy = AllowListPolicy::new(provider(), None);
        for creds in [
            Credentials::secret("pw"),
            Credentials::email_password("  ", "pw"),
            Credentials::email_password("artist@studio.com", ""),
        ] {
            let err = policy.verify(&creds).await.unwrap_err();
            assert_eq!(err, GateError::denied("Email and password are required."));
        }
    }

    #[test]
    fn permits_checks_email() {
        let policy = AllowListPolicy::new(provider(), Some("artist@studio.com".into()));
        assert!(policy.permits(&Identity::new("u", Some("ARTIST@studio.com".into()))));
        assert!(!policy.permits(&Identity::new("u", Some("x@y.z".into()))));
        assert!(!policy.permits(&Identity::new("u", None)));
    }

    #[test]
    fn credentials_parse_untagged_and_hide_secrets() {
        let creds: Credentials =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
        assert!(matches!(creds, Credentials::EmailPassword { .. }));
        let creds: Credentials = serde_json::from_str(r#"{"secret":"open-sesame"}"#).unwrap();
        assert!(matches!(creds, Credentials::Secret { .. }));
        assert!(!format!("{creds:?}").contains("open-sesame"));
        let creds = Credentials::email_password("a@b.c", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
