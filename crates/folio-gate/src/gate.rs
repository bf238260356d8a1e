use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::{AdminConfig, AdminPolicyConfig};
use crate::error::{GateError, GateResult};
use crate::identity::{Identity, RemoteIdentityProvider};
use crate::policy::{
    AdminPolicy, AllowListPolicy, AuthenticatedAdmin, Credentials, SharedSecretPolicy,
    NOT_ALLOWED_MESSAGE,
};
use crate::session::{AdminSession, SessionState, SessionToken};

enum Entry {
    Active(AdminSession),
    /// Forced out; kept so the next request can show why.
    Revoked {
        message: String,
        at: DateTime<Utc>,
    },
}

/// Issues and checks admin sessions under one [`AdminPolicy`].
///
/// Sessions expire after the idle TTL; every successful [`authorize`]
/// slides the expiry forward.
///
/// [`authorize`]: AdminGate::authorize
pub struct AdminGate {
    policy: Arc<dyn AdminPolicy>,
    ttl: Duration,
    sessions: Mutex<HashMap<SessionToken, Entry>>,
}

impl AdminGate {
    pub fn new(policy: Arc<dyn AdminPolicy>, ttl: std::time::Duration) -> Self {
        Self {
            policy,
            ttl: Duration::from_std(ttl).unwrap_or(Duration::hours(8)),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Build the gate and its policy from configuration.
    pub fn from_config(config: &AdminConfig) -> GateResult<Self> {
        let policy: Arc<dyn AdminPolicy> = match &config.policy {
            AdminPolicyConfig::Secret { secret } => Arc::new(SharedSecretPolicy::new(secret)?),
            AdminPolicyConfig::Identity {
                url,
                api_key,
                allowed_email,
                timeout_secs,
            } => {
                let provider = RemoteIdentityProvider::new(
                    url,
                    api_key,
                    std::time::Duration::from_secs(*timeout_secs),
                )?;
                Arc::new(AllowListPolicy::new(
                    Arc::new(provider),
                    allowed_email.clone(),
                ))
            }
        };
        info!(policy = policy.name(), "admin gate configured");
        Ok(Self::new(policy, config.session_ttl()))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Verify credentials and open a session.
    pub async fn log_in(&self, credentials: &Credentials) -> GateResult<AdminSession> {
        let admin = match self.policy.verify(credentials).await {
            Ok(admin) => admin,
            Err(e) => {
                warn!(error = %e, "admin login rejected");
                return Err(e);
            }
        };

        let now = Utc::now();
        let session = AdminSession {
            token: SessionToken::generate(),
            admin,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.lock().expect("lock poisoned");
        self.prune(&mut sessions, now);
        sessions.insert(session.token.clone(), Entry::Active(session.clone()));
        info!(admin = %session.admin.name, "admin logged in");
        Ok(session)
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn log_out(&self, token: &SessionToken) -> GateResult<()> {
        let removed = {
            let mut sessions = self.sessions.lock().expect("lock poisoned");
            let removed = sessions.remove(token);
            self.prune(&mut sessions, Utc::now());
            removed
        };
        if let Some(Entry::Active(session)) = removed {
            info!(admin = %session.admin.name, "admin logged out");
            self.release(&session.admin).await;
        }
        Ok(())
    }

    /// The live session for `token`, refreshing its idle expiry.
    pub fn authorize(&self, token: &SessionToken) -> GateResult<AdminSession> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().expect("lock poisoned");
        let outcome = match sessions.get_mut(token) {
            None => Err(GateError::NotLoggedIn),
            Some(Entry::Revoked { message, .. }) => Err(GateError::AuthDenied(message.clone())),
            Some(Entry::Active(session)) if session.expires_at <= now => {
                debug!(admin = %session.admin.name, "admin session expired");
                sessions.remove(token);
                Err(GateError::denied("Your session has expired. Please log in again."))
            }
            Some(Entry::Active(session)) => {
                session.expires_at = now + self.ttl;
                Ok(session.clone())
            }
        };
        // after the lookup, so an expired token still reports why
        self.prune(&mut sessions, now);
        outcome
    }

    /// Current state of `token` without touching its expiry.
    pub fn state(&self, token: &SessionToken) -> SessionState {
        let sessions = self.sessions.lock().expect("lock poisoned");
        match sessions.get(token) {
            Some(Entry::Active(session)) if session.expires_at > Utc::now() => {
                SessionState::LoggedIn(session.clone())
            }
            Some(Entry::Revoked { message, .. }) => SessionState::LoggedOut {
                message: Some(message.clone()),
            },
            _ => SessionState::LoggedOut { message: None },
        }
    }

    /// React to an identity-service change for the session behind `token`.
    ///
    /// `None` means the identity signed out elsewhere. An identity the policy
    /// no longer permits is forced out with [`NOT_ALLOWED_MESSAGE`].
    pub async fn observe_identity(
        &self,
        token: &SessionToken,
        identity: Option<Identity>,
    ) -> SessionState {
        let released = {
            let mut sessions = self.sessions.lock().expect("lock poisoned");
            let Some(Entry::Active(session)) = sessions.get_mut(token) else {
                drop(sessions);
                return self.state(token);
            };
            match identity {
                None => {
                    debug!(admin = %session.admin.name, "identity signed out");
                    sessions.remove(token);
                    return SessionState::LoggedOut { message: None };
                }
                Some(identity) if self.policy.permits(&identity) => {
                    if let Some(email) = &identity.email {
                        session.admin.name = email.clone();
                    }
                    session.admin.identity = Some(identity);
                    return SessionState::LoggedIn(session.clone());
                }
                Some(identity) => {
                    warn!(user = %identity.user_id, "identity no longer permitted; forcing logout");
                    let admin = session.admin.clone();
                    sessions.insert(
                        token.clone(),
                        Entry::Revoked {
                            message: NOT_ALLOWED_MESSAGE.to_string(),
                            at: Utc::now(),
                        },
                    );
                    AuthenticatedAdmin {
                        identity: Some(identity),
                        ..admin
                    }
                }
            }
        };
        self.release(&released).await;
        SessionState::LoggedOut {
            message: Some(NOT_ALLOWED_MESSAGE.to_string()),
        }
    }

    /// Number of live sessions.
    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|e| matches!(e, Entry::Active(s) if s.expires_at > now))
            .count()
    }

    async fn release(&self, admin: &AuthenticatedAdmin) {
        if let Err(e) = self.policy.release(admin).await {
            warn!(error = %e, "failed to release identity session");
        }
    }

    fn prune(&self, sessions: &mut HashMap<SessionToken, Entry>, now: DateTime<Utc>) {
        sessions.retain(|_, entry| match entry {
            Entry::Active(s) => s.expires_at > now,
            Entry::Revoked { at, .. } => *at + self.ttl > now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityProvider;

    const TTL: std::time::Duration = std::time::Duration::from_secs(3600);

    fn secret_gate() -> AdminGate {
        AdminGate::new(Arc::new(SharedSecretPolicy::new("s3cret").unwrap()), TTL)
    }

    fn identity_gate() -> (AdminGate, Arc<InMemoryIdentityProvider>) {
        let provider = Arc::new(
            InMemoryIdentityProvider::new()
                .with_account("artist@studio.com", "pw")
                .with_account("visitor@example.com", "pw"),
        );
        let policy = AllowListPolicy::new(provider.clone(), Some("artist@studio.com".into()));
        (AdminGate::new(Arc::new(policy), TTL), provider)
    }

    fn other_identity() -> Identity {
        Identity::new("user:visitor", Some("visitor@example.com".into()))
    }

    // ----- Login / logout -----

    #[tokio::test]
    async fn login_issues_authorized_token() {
        let gate = secret_gate();
        let session = gate.log_in(&Credentials::secret("s3cret")).await.unwrap();
        let authorized = gate.authorize(&session.token).unwrap();
        assert_eq!(authorized.admin.name, "admin");
        assert!(gate.state(&session.token).is_logged_in());
        assert_eq!(gate.active_sessions(), 1);
    }

    #[tokio::test]
    async fn wrong_secret_opens_no_session() {
        let gate = secret_gate();
        let err = gate.log_in(&Credentials::secret("nope")).await.unwrap_err();
        assert!(matches!(err, GateError::AuthDenied(_)));
        assert_eq!(gate.active_sessions(), 0);
    }

    #[tokio::test]
    async fn logout_ends_session_and_releases_identity() {
        let (gate, provider) = identity_gate();
        let session = gate
            .log_in(&Credentials::email_password("artist@studio.com", "pw"))
            .await
            .unwrap();
        gate.log_out(&session.token).await.unwrap();
        assert_eq!(gate.authorize(&session.token), Err(GateError::NotLoggedIn));
        assert_eq!(gate.state(&session.token), SessionState::LoggedOut { message: None });
        assert_eq!(provider.sign_out_count(), 1);
        // second logout is a no-op
        gate.log_out(&session.token).await.unwrap();
        assert_eq!(provider.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn unknown_token_is_not_logged_in() {
        let gate = secret_gate();
        let token = SessionToken::from("deadbeef");
        assert_eq!(gate.authorize(&token), Err(GateError::NotLoggedIn));
    }

    #[tokio::test]
    async fn disallowed_identity_is_denied_at_login() {
        let (gate, provider) = identity_gate();
        let err = gate
            .log_in(&Credentials::email_password("visitor@example.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::denied(NOT_ALLOWED_MESSAGE));
        assert_eq!(gate.active_sessions(), 0);
        assert_eq!(provider.sign_out_count(), 1);
    }

    // ----- Expiry -----

    #[tokio::test]
    async fn expired_session_is_denied() {
        let gate = AdminGate::new(
            Arc::new(SharedSecretPolicy::new("s3cret").unwrap()),
            std::time::Duration::ZERO,
        );
        let session = gate.log_in(&Credentials::secret("s3cret")).await.unwrap();
        let err = gate.authorize(&session.token).unwrap_err();
        assert!(matches!(err, GateError::AuthDenied(_)));
        assert_eq!(gate.authorize(&session.token), Err(GateError::NotLoggedIn));
    }

    #[tokio::test]
    async fn stale_sessions_are_dropped_outside_login() {
        let gate = AdminGate::new(
            Arc::new(SharedSecretPolicy::new("s3cret").unwrap()),
            std::time::Duration::ZERO,
        );
        gate.log_in(&Credentials::secret("s3cret")).await.unwrap();
        assert_eq!(gate.sessions.lock().unwrap().len(), 1);
        let stranger = SessionToken::from("deadbeef");
        assert_eq!(gate.authorize(&stranger), Err(GateError::NotLoggedIn));
        assert!(gate.sessions.lock().unwrap().is_empty());

        gate.log_in(&Credentials::secret("s3cret")).await.unwrap();
        gate.log_out(&stranger).await.unwrap();
        assert!(gate.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn authorize_slides_expiry() {
        let gate = secret_gate();
        let session = gate.log_in(&Credentials::secret("s3cret")).await.unwrap();
        let touched = gate.authorize(&session.token).unwrap();
        assert!(touched.expires_at >= session.expires_at);
    }

    // ----- Identity changes -----

    #[tokio::test]
    async fn identity_change_to_disallowed_forces_logout_with_message() {
        let (gate, provider) = identity_gate();
        let session = gate
            .log_in(&Credentials::email_password("artist@studio.com", "pw"))
            .await
            .unwrap();

        let state = gate
            .observe_identity(&session.token, Some(other_identity()))
            .await;
        assert_eq!(state.message(), Some(NOT_ALLOWED_MESSAGE));
        assert_eq!(
            gate.authorize(&session.token),
            Err(GateError::denied(NOT_ALLOWED_MESSAGE))
        );
        assert_eq!(gate.state(&session.token).message(), Some(NOT_ALLOWED_MESSAGE));
        assert_eq!(provider.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn identity_signed_out_elsewhere_ends_session_quietly() {
        let (gate, _) = identity_gate();
        let session = gate
            .log_in(&Credentials::email_password("artist@studio.com", "pw"))
            .await
            .unwrap();
        let state = gate.observe_identity(&session.token, None).await;
        assert_eq!(state, SessionState::LoggedOut { message: None });
        assert_eq!(gate.authorize(&session.token), Err(GateError::NotLoggedIn));
    }

    #[tokio::test]
    async fn permitted_identity_refresh_keeps_session() {
        let (gate, _) = identity_gate();
        let session = gate
            .log_in(&Credentials::email_password("artist@studio.com", "pw"))
            .await
            .unwrap();
        let refreshed = Identity::new("user:artist@studio.com", Some("Artist@Studio.com".into()));
        let state = gate.observe_identity(&session.token, Some(refreshed)).await;
        assert!(state.is_logged_in());
        assert!(gate.authorize(&session.token).is_ok());
    }

    #[tokio::test]
    async fn observing_unknown_token_is_logged_out() {
        let (gate, _) = identity_gate();
        let state = gate
            .observe_identity(&SessionToken::from("nope"), Some(other_identity()))
            .await;
        assert_eq!(state, SessionState::LoggedOut { message: None });
    }

    #[tokio::test]
    async fn from_config_builds_secret_gate() {
        let config = AdminConfig {
            policy: AdminPolicyConfig::Secret {
                secret: "s3cret".into(),
            },
            ..Default::default()
        };
        let gate = AdminGate::from_config(&config).unwrap();
        assert_eq!(gate.policy_name(), "secret");
        assert!(gate.log_in(&Credentials::secret("s3cret")).await.is_ok());
    }

    #[test]
    fn from_config_rejects_missing_secret() {
        let err = AdminGate::from_config(&AdminConfig::default()).err();
        assert!(matches!(err, Some(GateError::Config(_))));
    }
}
