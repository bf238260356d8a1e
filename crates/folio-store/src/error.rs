use folio_types::ArtworkId;

/// Errors from persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be read, or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backing store rejected an insert, update or delete.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The mutation target does not exist.
    #[error("artwork not found: {0}")]
    NotFound(ArtworkId),

    /// The image store rejected the payload, or the payload is not an image.
    #[error("image upload failed: {0}")]
    UploadFailed(String),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
