//! Error types for the rehearse core.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the agent service or the stores.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The collaborator answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The case store has no case with this id.
    #[error("case not found: {0}")]
    CaseNotFound(String),

    /// The history store rejected the bearer credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
