use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty artwork id")]
    EmptyId,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
