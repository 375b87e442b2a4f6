/// Unified error type for document store operations.
///
/// The first three variants are the failure classes callers branch on:
/// transport failures degrade, write rejections and enumeration failures propagate.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The remote store could not be reached (connect, timeout, TLS, ...)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store answered but reported an error for a write
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// Enumerating documents ahead of a bulk delete failed
    #[error("Bulk delete failed: {0}")]
    BulkDeleteFailed(String),

    /// The store answered with a status or body we could not interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(feature = "couchdb")]
impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::UnexpectedResponse(err.to_string())
        } else {
            Self::StoreUnavailable(err.to_string())
        }
    }
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
