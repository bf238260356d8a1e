use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use folio_catalog::{CatalogError, ErrorKind};
use folio_gate::GateError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("{0}")]
    Validation(String),

    #[error("artwork not found: {0}")]
    NotFound(String),

    #[error("contact relay is not configured")]
    ContactDisabled,

    #[error("message could not be sent: {0}")]
    ContactFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::WriteFailed | ErrorKind::UploadFailed => StatusCode::BAD_GATEWAY,
            },
            Self::Gate(GateError::AuthDenied(_) | GateError::NotLoggedIn) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Gate(GateError::Provider(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Gate(GateError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ContactDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::ContactFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
