use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use folio_catalog::CatalogStore;
use folio_gate::{AdminGate, AdminSession, GateError, SessionToken};

use crate::contact::ContactRelay;
use crate::error::ServerError;

/// Shared handles every handler sees.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub gate: Arc<AdminGate>,
    pub contact: Option<Arc<dyn ContactRelay>>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogStore>, gate: Arc<AdminGate>) -> Self {
        Self {
            catalog,
            gate,
            contact: None,
        }
    }

    pub fn with_contact(mut self, relay: Arc<dyn ContactRelay>) -> Self {
        self.contact = Some(relay);
        self
    }
}

/// The `Authorization: Bearer <token>` value, unchecked.
#[derive(Clone, Debug)]
pub struct BearerToken(pub SessionToken);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(GateError::NotLoggedIn)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(GateError::NotLoggedIn)?;
        Ok(Self(SessionToken::from(token)))
    }
}

/// A request carrying a live admin session.
#[derive(Clone, Debug)]
pub struct Admin(pub AdminSession);

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let session = state.gate.authorize(&token)?;
        tracing::debug!(admin = %session.admin.name, "admin request authorized");
        Ok(Self(session))
    }
}
