use thiserror::Error;

/// Errors from the admin gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Credentials rejected, identity not allow-listed, or session revoked.
    /// The message is displayable.
    #[error("{0}")]
    AuthDenied(String),

    /// No session exists for the presented token.
    #[error("Please log in to continue.")]
    NotLoggedIn,

    /// The identity service could not be reached.
    #[error("identity service error: {0}")]
    Provider(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GateError {
    pub fn denied(message: impl Into<String>) -> Self {
        Self::AuthDenied(message.into())
    }
}

pub type GateResult<T> = Result<T, GateError>;
