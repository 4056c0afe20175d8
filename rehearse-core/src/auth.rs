//! Bearer credential for the history store.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable read when no token is configured.
pub const TOKEN_ENV_VAR: &str = "REHEARSE_TOKEN";

/// A bearer token issued by the account service.
///
/// Wrapped in `SecretString` so it is redacted from `Debug` output and
/// zeroized on drop.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Read the token from [`TOKEN_ENV_VAR`], ignoring blank values.
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    /// Expose the raw token.
    ///
    /// Use only when building the `Authorization` header.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let credential = Credential::new("eyJ.secret.sig");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn expose_secret_returns_token() {
        let credential = Credential::from("abc");
        assert_eq!(credential.expose_secret(), "abc");
    }
}
