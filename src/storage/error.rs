//! Storage-specific error types.
//!
//! All storage operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (database, pool, channel).

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The backing medium cannot be reached (pool checkout failed).
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] r2d2::Error),

    /// Failed to send a command to the writer actor, or the actor went away
    /// before replying.
    #[error("failed to send command to writer actor")]
    ChannelSend,

    /// Internal error (e.g., thread spawn or join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
