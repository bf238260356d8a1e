use std::fmt;

use folio_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before any backend call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The failure class shown to the user.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::WriteFailed(_)) => ErrorKind::WriteFailed,
            Self::Store(StoreError::UploadFailed(_)) => ErrorKind::UploadFailed,
            Self::Store(
                StoreError::Unavailable(_)
                | StoreError::Serialization(_)
                | StoreError::Config(_),
            ) => ErrorKind::StoreUnavailable,
        }
    }
}

/// User-facing failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Validation,
    StoreUnavailable,
    WriteFailed,
    NotFound,
    UploadFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "ValidationError",
            Self::StoreUnavailable => "StoreUnavailable",
            Self::WriteFailed => "WriteFailed",
            Self::NotFound => "NotFound",
            Self::UploadFailed => "UploadFailed",
        };
        f.write_str(name)
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
