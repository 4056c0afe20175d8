//! HS256 token validation and issuing

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{AuthError, Identity};

/// Lifetime of tokens minted by [`TokenValidator::issue`] (7 days).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claims carried by account tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    pub exp: i64,
}

/// Validates (and, for tooling, issues) bearer tokens signed with a shared secret
#[derive(Clone)]
pub struct TokenValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    leeway_seconds: u64,
}

impl TokenValidator {
    /// Create a validator for the given shared secret
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            leeway_seconds: 0,
        }
    }

    /// Accept tokens up to `seconds` past their expiry
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Validate a token and return the caller identity
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_seconds;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(token_error)?;

        let claims = data.claims;
        if claims.user_id.trim().is_empty() {
            return Err(AuthError::MissingUserId);
        }
        Ok(Identity::new(claims.user_id, claims.email))
    }

    /// Mint a token for an identity
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            exp: Utc::now().timestamp().saturating_add(ttl),
        };
        self.sign(&claims)
    }

    /// Mint a token with an explicit expiry timestamp (seconds since epoch)
    pub fn issue_with_expiry(&self, identity: &Identity, exp: i64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            exp,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, claims, &self.encoding)?)
    }
}

fn token_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::JwtError(e),
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}
