//! Unified error types for sitegate.
//!
//! Each variant carries a stable upper-case prefix so log lines can be
//! grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the edge layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty site identifier).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Key-value cache could not be reached.
    #[error("CACHE_ERROR: {0}")]
    CacheUnavailable(String),

    /// Origin authority could not answer (transport failure or unexpected status).
    #[error("ORIGIN_UNAVAILABLE: {0}")]
    OriginUnavailable(String),

    /// Object store failed for a reason other than absence.
    #[error("STORE_ERROR: {0}")]
    Store(String),

    /// Upstream HTTP origin could not be reached.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
