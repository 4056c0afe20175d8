//! Authentication error types

use thiserror::Error;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// No authentication token was provided in the request
    #[error("no authentication token provided")]
    MissingToken,

    /// The `Authorization` header is not a bearer token
    #[error("invalid authorization header")]
    InvalidHeader,

    /// The token has expired
    #[error("token has expired")]
    Expired,

    /// The token is well formed but carries no user id
    #[error("token has no user id")]
    MissingUserId,

    /// JWT decoding error from jsonwebtoken crate
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}
