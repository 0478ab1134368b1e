//! Error types for the track store.

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested row does not exist
    #[error("{0}")]
    NotFound(String),

    /// Operation conflicts with existing state (duplicate name, bad transition)
    #[error("{0}")]
    Conflict(String),

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
