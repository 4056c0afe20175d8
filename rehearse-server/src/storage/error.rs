//! Error types for history and case storage.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error from libSQL.
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in the database.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The record exists and belongs to another user.
    #[error("session {0} is owned by another user")]
    Forbidden(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_names_the_session() {
        let err = Error::Forbidden("s-1".to_string());
        assert_eq!(err.to_string(), "session s-1 is owned by another user");
    }
}
